//! On-disk cache of compiled modules.
//!
//! # Cache Directory Structure
//!
//! ```text
//! <cache_dir>/
//! ├── <module>.lasrmod    # Bincode-encoded CacheEntry
//! └── ...
//! ```
//!
//! An entry records the format version it was written with. Entries from
//! another version, and entries that fail to decode, are misses: the
//! module is compiled from source and the entry is overwritten.

use std::path::{Path, PathBuf};

use lasr_sema::{CacheError, ModuleCache, TypedModule};
use serde::{Deserialize, Serialize};

/// Bumped whenever the layout of [`TypedModule`] changes.
const FORMAT_VERSION: u32 = 1;

const EXTENSION: &str = "lasrmod";

#[derive(Serialize)]
struct EntryRef<'a> {
    format: u32,
    module: &'a TypedModule,
}

#[derive(Deserialize)]
struct Entry {
    format: u32,
    module: TypedModule,
}

/// A [`ModuleCache`] storing one file per module in a directory.
#[derive(Clone, Debug)]
pub struct FileModuleCache {
    dir: PathBuf,
}

impl FileModuleCache {
    /// Open the cache at `dir`, creating the directory if needed.
    pub fn new(dir: &Path) -> Result<Self, CacheError> {
        std::fs::create_dir_all(dir)?;
        Ok(FileModuleCache {
            dir: dir.to_path_buf(),
        })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    #[must_use]
    pub fn has(&self, name: &str) -> bool {
        self.entry_path(name).exists()
    }

    /// Remove every stored module.
    pub fn clear(&self) -> Result<(), CacheError> {
        for entry in std::fs::read_dir(&self.dir)? {
            let path = entry?.path();
            if path.extension().is_some_and(|ext| ext == EXTENSION) {
                std::fs::remove_file(&path)?;
            }
        }
        Ok(())
    }

    fn entry_path(&self, name: &str) -> PathBuf {
        self.dir.join(format!("{name}.{EXTENSION}"))
    }
}

impl ModuleCache for FileModuleCache {
    fn load_cached(&mut self, name: &str) -> Option<TypedModule> {
        let path = self.entry_path(name);
        let data = std::fs::read(&path).ok()?;
        let entry: Entry = match bincode::deserialize(&data) {
            Ok(entry) => entry,
            Err(e) => {
                tracing::debug!(module = name, error = %e, "discarding undecodable cache entry");
                return None;
            }
        };
        if entry.format != FORMAT_VERSION || entry.module.name != name {
            tracing::debug!(
                module = name,
                format = entry.format,
                "discarding mismatched cache entry"
            );
            return None;
        }
        tracing::trace!(module = name, path = %path.display(), "cache hit");
        Some(entry.module)
    }

    fn store_cached(&mut self, name: &str, module: &TypedModule) -> Result<(), CacheError> {
        let entry = EntryRef {
            format: FORMAT_VERSION,
            module,
        };
        let data = bincode::serialize(&entry).map_err(|e| CacheError::Encode(e.to_string()))?;
        std::fs::write(self.entry_path(name), data)?;
        Ok(())
    }
}

#[cfg(test)]
#[expect(clippy::unwrap_used, reason = "Tests use unwrap for brevity")]
mod tests;
