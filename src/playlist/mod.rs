//! Playback order
//!
//! Two parallel orders are kept: the stable user-supplied one and the
//! active one actually walked during playback. The active order is always
//! re-derived from the original (identity or a fresh permutation), never
//! patched in place.

use std::path::{Path, PathBuf};

use rand::seq::SliceRandom;

#[derive(Debug, Clone, Default)]
pub struct Playlist {
    original: Vec<PathBuf>,
    active: Vec<PathBuf>,
    current: Option<usize>,
    shuffled: bool,
}

impl Playlist {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the whole playlist. The active order is re-derived from
    /// scratch honoring the current shuffle flag; nothing is current yet.
    pub fn replace(&mut self, paths: Vec<PathBuf>) {
        self.original = paths;
        self.current = None;
        self.rebuild_active();
    }

    /// Rebuild both orders from a persisted session. Only the original
    /// order and the shuffle flag are persisted; a shuffled active order
    /// is a fresh permutation every time.
    pub fn restore(&mut self, original: Vec<PathBuf>, shuffled: bool) {
        self.original = original;
        self.shuffled = shuffled;
        self.current = None;
        self.rebuild_active();
    }

    /// Toggle shuffle mode, regenerating the active order and re-locating
    /// the current track by path identity (a full-order shuffle may move
    /// it anywhere).
    pub fn toggle_shuffle(&mut self) {
        self.shuffled = !self.shuffled;
        let keep = self.current_path().map(Path::to_path_buf);
        self.rebuild_active();
        self.current = keep
            .as_deref()
            .and_then(|path| self.position_of(path));
    }

    fn rebuild_active(&mut self) {
        self.active = self.original.clone();
        if self.shuffled {
            self.active.shuffle(&mut rand::rng());
        }
    }

    /// Mark the track at `index` current. Out-of-range indices are refused.
    pub fn set_current(&mut self, index: usize) -> bool {
        if index < self.active.len() {
            self.current = Some(index);
            true
        } else {
            false
        }
    }

    pub fn clear_current(&mut self) {
        self.current = None;
    }

    pub fn current(&self) -> Option<usize> {
        self.current
    }

    pub fn current_path(&self) -> Option<&Path> {
        self.current.and_then(|i| self.path_at(i))
    }

    pub fn path_at(&self, index: usize) -> Option<&Path> {
        self.active.get(index).map(PathBuf::as_path)
    }

    /// Position of `path` in the active order.
    pub fn position_of(&self, path: &Path) -> Option<usize> {
        self.active.iter().position(|p| p == path)
    }

    pub fn original(&self) -> &[PathBuf] {
        &self.original
    }

    pub fn shuffled(&self) -> bool {
        self.shuffled
    }

    pub fn len(&self) -> usize {
        self.active.len()
    }

    pub fn is_empty(&self) -> bool {
        self.active.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn paths(names: &[&str]) -> Vec<PathBuf> {
        names.iter().map(PathBuf::from).collect()
    }

    fn sorted(mut v: Vec<PathBuf>) -> Vec<PathBuf> {
        v.sort();
        v
    }

    #[test]
    fn test_replace_resets_current() {
        let mut pl = Playlist::new();
        pl.replace(paths(&["a", "b"]));
        pl.set_current(1);

        pl.replace(paths(&["c"]));
        assert_eq!(pl.current(), None);
        assert_eq!(pl.len(), 1);
    }

    #[test]
    fn test_active_is_always_a_permutation_of_original() {
        let mut pl = Playlist::new();
        pl.replace(paths(&["a", "b", "c", "d", "e"]));

        for _ in 0..20 {
            pl.toggle_shuffle();
            let active: Vec<PathBuf> = (0..pl.len())
                .map(|i| pl.path_at(i).unwrap().to_path_buf())
                .collect();
            assert_eq!(sorted(active), sorted(pl.original().to_vec()));
        }
    }

    #[test]
    fn test_toggle_shuffle_relocates_current_by_path() {
        let mut pl = Playlist::new();
        pl.replace(paths(&["a", "b", "c", "d", "e"]));
        pl.set_current(2);
        let playing = pl.current_path().unwrap().to_path_buf();

        pl.toggle_shuffle();
        assert_eq!(pl.current_path().unwrap(), playing.as_path());

        pl.toggle_shuffle();
        assert_eq!(pl.current_path().unwrap(), playing.as_path());
    }

    #[test]
    fn test_unshuffle_restores_original_order() {
        let mut pl = Playlist::new();
        pl.replace(paths(&["a", "b", "c"]));
        pl.toggle_shuffle();
        pl.toggle_shuffle();
        assert!(!pl.shuffled());
        let active: Vec<PathBuf> = (0..pl.len())
            .map(|i| pl.path_at(i).unwrap().to_path_buf())
            .collect();
        assert_eq!(active, paths(&["a", "b", "c"]));
    }

    #[test]
    fn test_set_current_refuses_out_of_range() {
        let mut pl = Playlist::new();
        pl.replace(paths(&["a", "b"]));
        assert!(pl.set_current(1));
        assert!(!pl.set_current(2));
        assert_eq!(pl.current(), Some(1));
    }

    #[test]
    fn test_restore_with_shuffle_produces_permutation() {
        let mut pl = Playlist::new();
        pl.restore(paths(&["a", "b", "c", "d"]), true);
        assert!(pl.shuffled());
        assert_eq!(pl.current(), None);
        let active: Vec<PathBuf> = (0..pl.len())
            .map(|i| pl.path_at(i).unwrap().to_path_buf())
            .collect();
        assert_eq!(sorted(active), sorted(pl.original().to_vec()));
    }
}
