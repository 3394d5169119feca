//! Single-file JSON backend

use std::fs;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::{Persistence, StoreError, StoreResult};

/// Stores the history payload in one file, replaced atomically on save
#[derive(Debug, Clone)]
pub struct JsonFilePersistence {
    path: PathBuf,
}

impl JsonFilePersistence {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Persistence for JsonFilePersistence {
    fn load(&self) -> StoreResult<Option<Vec<u8>>> {
        if !self.path.exists() {
            return Ok(None);
        }

        let contents = fs::read(&self.path)?;
        if contents.iter().all(u8::is_ascii_whitespace) {
            return Ok(None);
        }

        debug!(path = %self.path.display(), bytes = contents.len(), "History file read");
        Ok(Some(contents))
    }

    fn save(&self, payload: &[u8]) -> StoreResult<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }

        let temp_path = self.path.with_extension("tmp");
        let file = fs::File::create(&temp_path)?;
        let mut writer = BufWriter::new(file);
        writer.write_all(payload)?;
        writer.write_all(b"\n")?;
        writer.flush()?;
        drop(writer);

        match fs::rename(&temp_path, &self.path) {
            Ok(()) => {}
            Err(_) if self.path.exists() => {
                let _ = fs::remove_file(&self.path);
                fs::rename(&temp_path, &self.path).map_err(StoreError::from)?;
            }
            Err(err) => return Err(StoreError::from(err)),
        }

        debug!(path = %self.path.display(), bytes = payload.len(), "History file written");
        Ok(())
    }

    fn describe(&self) -> String {
        self.path.display().to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_loads_none() {
        let dir = tempfile::tempdir().unwrap();
        let persistence = JsonFilePersistence::new(dir.path().join("history.json"));
        assert!(persistence.load().unwrap().is_none());
    }

    #[test]
    fn blank_file_loads_none() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("history.json");
        fs::write(&path, "  \n").unwrap();

        let persistence = JsonFilePersistence::new(&path);
        assert!(persistence.load().unwrap().is_none());
    }

    #[test]
    fn save_creates_parent_and_replaces() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("history.json");
        let persistence = JsonFilePersistence::new(&path);

        persistence.save(b"[1]").unwrap();
        persistence.save(b"[1,2]").unwrap();

        let loaded = persistence.load().unwrap().unwrap();
        assert_eq!(String::from_utf8(loaded).unwrap().trim(), "[1,2]");
        assert!(!path.with_extension("tmp").exists());
    }
}
