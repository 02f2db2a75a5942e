//! Persistent state: lyrics cache, per-track lyric offsets and the
//! session key-value table, all in one sqlite file.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use anyhow::Context;
use rusqlite::{Connection, params};

pub struct Storage {
    conn: Connection,
}

impl Storage {
    pub fn open(path: &Path) -> anyhow::Result<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("create dir {}", parent.display()))?;
        }

        let conn = Connection::open(path).with_context(|| format!("open {}", path.display()))?;
        let s = Self { conn };
        s.init_schema()?;
        Ok(s)
    }

    fn init_schema(&self) -> anyhow::Result<()> {
        self.conn
            .execute_batch(
                r#"
CREATE TABLE IF NOT EXISTS kv (
  key TEXT PRIMARY KEY,
  value TEXT NOT NULL,
  updated_at INTEGER NOT NULL
);

CREATE TABLE IF NOT EXISTS lyrics_cache (
  track_id TEXT PRIMARY KEY,
  content TEXT NOT NULL,
  fetched_at INTEGER NOT NULL
);

CREATE TABLE IF NOT EXISTS lyric_offsets (
  track_id TEXT PRIMARY KEY,
  offset_secs REAL NOT NULL,
  updated_at INTEGER NOT NULL
);
"#,
            )
            .context("init schema")?;
        Ok(())
    }

    pub fn get_kv(&self, key: &str) -> anyhow::Result<Option<String>> {
        let mut stmt = self
            .conn
            .prepare("SELECT value FROM kv WHERE key=?1")
            .context("prepare kv get")?;
        let mut rows = stmt.query(params![key]).context("query kv")?;
        if let Some(row) = rows.next().context("read kv row")? {
            Ok(Some(row.get(0)?))
        } else {
            Ok(None)
        }
    }

    pub fn set_kv(&self, key: &str, value: &str, now_unix: i64) -> anyhow::Result<()> {
        self.conn
            .execute(
                r#"
INSERT INTO kv(key, value, updated_at)
VALUES(?1, ?2, ?3)
ON CONFLICT(key) DO UPDATE SET
  value=excluded.value,
  updated_at=excluded.updated_at
"#,
                params![key, value, now_unix],
            )
            .context("set kv")?;
        Ok(())
    }

    /// Cached raw lyrics text for a track id (fingerprint).
    pub fn get_lyrics(&self, track_id: &str) -> anyhow::Result<Option<String>> {
        let mut stmt = self
            .conn
            .prepare("SELECT content FROM lyrics_cache WHERE track_id=?1")?;
        let mut rows = stmt.query(params![track_id])?;
        if let Some(row) = rows.next()? {
            Ok(Some(row.get(0)?))
        } else {
            Ok(None)
        }
    }

    pub fn put_lyrics(&self, track_id: &str, content: &str, now_unix: i64) -> anyhow::Result<()> {
        self.conn
            .execute(
                r#"
INSERT INTO lyrics_cache(track_id, content, fetched_at)
VALUES(?1, ?2, ?3)
ON CONFLICT(track_id) DO UPDATE SET
  content=excluded.content,
  fetched_at=excluded.fetched_at
"#,
                params![track_id, content, now_unix],
            )
            .context("cache lyrics")?;
        Ok(())
    }

    /// The whole offset map. Loaded once at startup; entries are only
    /// ever added or overwritten, never removed.
    pub fn load_offsets(&self) -> anyhow::Result<HashMap<String, f64>> {
        let mut stmt = self
            .conn
            .prepare("SELECT track_id, offset_secs FROM lyric_offsets")?;
        let offsets = stmt
            .query_map([], |row| {
                let track_id: String = row.get(0)?;
                let offset: f64 = row.get(1)?;
                Ok((track_id, offset))
            })?
            .filter_map(|r| r.ok())
            .collect();
        Ok(offsets)
    }

    pub fn set_offset(&self, track_id: &str, offset_secs: f64, now_unix: i64) -> anyhow::Result<()> {
        self.conn
            .execute(
                r#"
INSERT INTO lyric_offsets(track_id, offset_secs, updated_at)
VALUES(?1, ?2, ?3)
ON CONFLICT(track_id) DO UPDATE SET
  offset_secs=excluded.offset_secs,
  updated_at=excluded.updated_at
"#,
                params![track_id, offset_secs, now_unix],
            )
            .context("set lyric offset")?;
        Ok(())
    }
}

pub fn now_unix() -> i64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs() as i64
}

// Simple way to use rusqlite from async tasks: open per-operation.
// Writes are rare (snapshots, offset nudges, cache fills), so connection
// setup cost is irrelevant next to correctness.
#[derive(Debug, Clone)]
pub struct StorageHandle {
    path: PathBuf,
}

impl StorageHandle {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    fn open(&self) -> anyhow::Result<Storage> {
        Storage::open(&self.path)
    }

    pub fn get_kv(&self, key: &str) -> anyhow::Result<Option<String>> {
        self.open()?.get_kv(key)
    }

    pub fn set_kv(&self, key: &str, value: &str, now_unix: i64) -> anyhow::Result<()> {
        self.open()?.set_kv(key, value, now_unix)
    }

    pub fn get_lyrics(&self, track_id: &str) -> anyhow::Result<Option<String>> {
        self.open()?.get_lyrics(track_id)
    }

    pub fn put_lyrics(&self, track_id: &str, content: &str, now_unix: i64) -> anyhow::Result<()> {
        self.open()?.put_lyrics(track_id, content, now_unix)
    }

    pub fn load_offsets(&self) -> anyhow::Result<HashMap<String, f64>> {
        self.open()?.load_offsets()
    }

    pub fn set_offset(&self, track_id: &str, offset_secs: f64, now_unix: i64) -> anyhow::Result<()> {
        self.open()?.set_offset(track_id, offset_secs, now_unix)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn test_handle(dir: &tempfile::TempDir) -> StorageHandle {
        StorageHandle::new(dir.path().join("test.sqlite3"))
    }

    #[test]
    fn test_lyrics_cache_roundtrip() {
        let dir = tempdir().unwrap();
        let storage = test_handle(&dir);

        assert_eq!(storage.get_lyrics("A - T - 213").unwrap(), None);
        storage
            .put_lyrics("A - T - 213", "[00:01.00]hi", now_unix())
            .unwrap();
        assert_eq!(
            storage.get_lyrics("A - T - 213").unwrap().as_deref(),
            Some("[00:01.00]hi")
        );

        // Overwrite keeps a single row.
        storage
            .put_lyrics("A - T - 213", "[00:02.00]bye", now_unix())
            .unwrap();
        assert_eq!(
            storage.get_lyrics("A - T - 213").unwrap().as_deref(),
            Some("[00:02.00]bye")
        );
    }

    #[test]
    fn test_offset_upsert_and_load() {
        let dir = tempdir().unwrap();
        let storage = test_handle(&dir);

        storage.set_offset("F", 0.1, now_unix()).unwrap();
        storage.set_offset("F", 0.2, now_unix()).unwrap();
        storage.set_offset("G", -0.3, now_unix()).unwrap();

        let offsets = storage.load_offsets().unwrap();
        assert_eq!(offsets.len(), 2);
        assert_eq!(offsets["F"], 0.2);
        assert_eq!(offsets["G"], -0.3);
    }

    #[test]
    fn test_kv_roundtrip() {
        let dir = tempdir().unwrap();
        let storage = test_handle(&dir);

        assert_eq!(storage.get_kv("session").unwrap(), None);
        storage.set_kv("session", r#"{"x":1}"#, now_unix()).unwrap();
        assert_eq!(
            storage.get_kv("session").unwrap().as_deref(),
            Some(r#"{"x":1}"#)
        );
    }
}
