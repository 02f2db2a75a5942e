//! Local track model: tag extraction, track identity and file enumeration.

use std::path::{Path, PathBuf};

use lofty::file::TaggedFile;
use lofty::prelude::{Accessor, AudioFile, ItemKey, TaggedFileExt};
use lofty::probe::Probe;

/// Extensions the player recognizes when expanding a directory.
pub const AUDIO_EXTENSIONS: [&str; 5] = ["mp3", "wav", "flac", "m4a", "mp4"];

/// Everything the UI needs about a loaded file, produced once per load.
#[derive(Debug, Clone)]
pub struct Track {
    pub path: PathBuf,
    pub basename: String,
    pub title: String,
    pub artist: String,
    pub cover: Option<Vec<u8>>,
    pub embedded_lyrics: Option<String>,
    /// Duration as reported by the tag reader. The transport's measured
    /// duration supersedes this once the file is actually decoded.
    pub duration_hint: Option<f64>,
}

impl Track {
    /// Degraded record used when tag reading fails: the file still plays,
    /// it just shows up under its filename.
    fn degraded(path: &Path) -> Self {
        Self {
            path: path.to_path_buf(),
            basename: basename_of(path),
            title: stem_of(path),
            artist: "Unknown Artist".to_string(),
            cover: None,
            embedded_lyrics: None,
            duration_hint: None,
        }
    }
}

/// Read tags for `path`. Never fails: unreadable files yield a degraded
/// record so playback can still be attempted.
pub fn extract(path: &Path) -> Track {
    let tagged = match read_tags(path) {
        Ok(tagged) => tagged,
        Err(e) => {
            tracing::warn!("tag read failed for {}: {e:#}", path.display());
            return Track::degraded(path);
        }
    };

    let tag = tagged.primary_tag().or_else(|| tagged.first_tag());

    let title = tag
        .and_then(|t| t.title().map(|s| s.trim().to_string()))
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| stem_of(path));
    let artist = tag
        .and_then(|t| t.artist().map(|s| s.trim().to_string()))
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| "Unknown Artist".to_string());
    let embedded_lyrics = tag
        .and_then(|t| t.get_string(&ItemKey::Lyrics).map(String::from))
        .filter(|s| !s.trim().is_empty());
    let cover = tag.and_then(|t| t.pictures().first().map(|p| p.data().to_vec()));

    let duration = tagged.properties().duration().as_secs_f64();
    let duration_hint = (duration > 0.0).then_some(duration);

    Track {
        path: path.to_path_buf(),
        basename: basename_of(path),
        title,
        artist,
        cover,
        embedded_lyrics,
        duration_hint,
    }
}

fn read_tags(path: &Path) -> anyhow::Result<TaggedFile> {
    Ok(Probe::open(path)?.guess_file_type()?.read()?)
}

/// Stable identity for a track, used as the lyrics-cache and offset key.
/// The duration participates rounded to whole seconds so sub-second
/// jitter between tag reader and decoder cannot fragment the key space.
pub fn fingerprint(artist: &str, title: &str, duration_secs: f64) -> String {
    format!("{} - {} - {}", artist, title, duration_secs.round() as i64)
}

/// Enumerate playable files directly inside `dir` (non-recursive), sorted
/// by path. Read failures are logged and yield an empty list.
pub fn list_audio_files(dir: &Path) -> Vec<PathBuf> {
    let entries = match std::fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) => {
            tracing::warn!("cannot scan {}: {e}", dir.display());
            return Vec::new();
        }
    };

    let mut files: Vec<PathBuf> = entries
        .filter_map(Result::ok)
        .map(|entry| entry.path())
        .filter(|path| path.is_file() && is_audio_file(path))
        .collect();
    files.sort();
    files
}

fn is_audio_file(path: &Path) -> bool {
    path.extension()
        .and_then(|s| s.to_str())
        .map(|ext| {
            let ext = ext.to_ascii_lowercase();
            AUDIO_EXTENSIONS.iter().any(|e| *e == ext)
        })
        .unwrap_or(false)
}

fn basename_of(path: &Path) -> String {
    path.file_name()
        .and_then(|s| s.to_str())
        .unwrap_or("unknown")
        .to_string()
}

fn stem_of(path: &Path) -> String {
    path.file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("unknown")
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn test_fingerprint_is_stable() {
        let a = fingerprint("Artist", "Title", 213.4);
        let b = fingerprint("Artist", "Title", 213.4);
        assert_eq!(a, b);
        assert_eq!(a, "Artist - Title - 213");
    }

    #[test]
    fn test_fingerprint_ignores_subsecond_jitter() {
        assert_eq!(
            fingerprint("A", "T", 213.2),
            fingerprint("A", "T", 213.4)
        );
        assert_ne!(
            fingerprint("A", "T", 213.0),
            fingerprint("A", "T", 214.0)
        );
    }

    #[test]
    fn test_is_audio_file_matches_known_extensions() {
        assert!(is_audio_file(Path::new("/tmp/a.mp3")));
        assert!(is_audio_file(Path::new("/tmp/a.MP3")));
        assert!(is_audio_file(Path::new("/tmp/a.flac")));
        assert!(is_audio_file(Path::new("/tmp/a.m4a")));
        assert!(!is_audio_file(Path::new("/tmp/a.ogg")));
        assert!(!is_audio_file(Path::new("/tmp/a.txt")));
        assert!(!is_audio_file(Path::new("/tmp/a")));
    }

    #[test]
    fn test_list_audio_files_filters_and_sorts() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("b.mp3"), b"x").unwrap();
        fs::write(dir.path().join("a.flac"), b"x").unwrap();
        fs::write(dir.path().join("notes.txt"), b"x").unwrap();
        fs::create_dir(dir.path().join("sub")).unwrap();
        fs::write(dir.path().join("sub").join("nested.mp3"), b"x").unwrap();

        let files = list_audio_files(dir.path());
        let names: Vec<String> = files
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        // non-recursive, non-audio filtered, sorted
        assert_eq!(names, vec!["a.flac", "b.mp3"]);
    }

    #[test]
    fn test_list_audio_files_missing_dir_is_empty() {
        assert!(list_audio_files(Path::new("/definitely/not/here")).is_empty());
    }

    #[test]
    fn test_extract_degrades_on_unreadable_file() {
        let track = extract(Path::new("/no/such/file.mp3"));
        assert_eq!(track.basename, "file.mp3");
        assert_eq!(track.title, "file");
        assert_eq!(track.artist, "Unknown Artist");
        assert!(track.embedded_lyrics.is_none());
        assert!(track.duration_hint.is_none());
    }
}
