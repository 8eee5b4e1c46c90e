use std::path::PathBuf;
use std::sync::Arc;

use log::error;
use utils::shared_cache::SharedCache;

/// Source of named static resources (textures, font metadata, markup).
pub trait ResourceManager: Send + Sync {
    fn load(&self, name: &str) -> Option<Arc<Vec<u8>>>;
}

/// Loads resources from files under a directory, caching the bytes so
/// repeat loads of the same name return the identical shared buffer.
pub struct FileResourceManager {
    directory: PathBuf,
    cache: SharedCache<String, Vec<u8>>,
}

impl FileResourceManager {
    pub fn new(directory: impl Into<PathBuf>) -> Self {
        Self {
            directory: directory.into(),
            cache: SharedCache::new(),
        }
    }

    pub fn directory(&self) -> &std::path::Path {
        &self.directory
    }
}

impl ResourceManager for FileResourceManager {
    fn load(&self, name: &str) -> Option<Arc<Vec<u8>>> {
        if let Some(hit) = self.cache.get(&name.to_owned()) {
            return Some(hit);
        }

        let path = self.directory.join(name);
        match std::fs::read(&path) {
            Ok(bytes) => Some(self.cache.add(name.to_owned(), bytes)),
            Err(err) => {
                error!("could not load resource {name} from {}: {err}", path.display());
                None
            }
        }
    }
}
