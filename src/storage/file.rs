use std::{
    fs,
    io::{self, Write},
    path::{Path, PathBuf},
};

use crate::{errors::AppResult, storage::SlotStorage};

/// One file per slot inside a directory, so a session survives restarts.
pub struct FileStorage {
    dir: PathBuf,
}

impl FileStorage {
    pub fn open(dir: impl Into<PathBuf>) -> AppResult<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir)?;
        log::debug!("Using slot storage at {}", dir.display());
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn slot_path(&self, slot: &str) -> PathBuf {
        // Slot names are fixed identifiers; strip anything that could escape the directory.
        let name: String = slot
            .chars()
            .filter(|c| c.is_ascii_alphanumeric() || *c == '_' || *c == '-')
            .collect();
        self.dir.join(format!("{}.slot", name))
    }

    fn write_atomic(&self, path: &Path, value: &str) -> io::Result<()> {
        let tmp = path.with_extension("slot.tmp");
        {
            let mut file = fs::File::create(&tmp)?;
            file.write_all(value.as_bytes())?;
            file.sync_all()?;
        }
        fs::rename(&tmp, path)
    }
}

impl SlotStorage for FileStorage {
    fn load(&self, slot: &str) -> Option<String> {
        match fs::read_to_string(self.slot_path(slot)) {
            Ok(value) => Some(value),
            Err(e) if e.kind() == io::ErrorKind::NotFound => None,
            Err(e) => {
                log::warn!("Failed to read slot '{}': {}", slot, e);
                None
            }
        }
    }

    fn save(&self, slot: &str, value: &str) {
        let path = self.slot_path(slot);
        if let Err(e) = self.write_atomic(&path, value) {
            log::warn!("Failed to write slot '{}': {}", slot, e);
        }
    }

    fn remove(&self, slot: &str) {
        match fs::remove_file(self.slot_path(slot)) {
            Ok(()) => {}
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(e) => log::warn!("Failed to remove slot '{}': {}", slot, e),
        }
    }
}
