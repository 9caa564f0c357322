use crate::data::Cache;
use std::fs;
use std::path::PathBuf;
use tracing::warn;

/// Default root folder for cached generator replies.
pub const DEFAULT_CACHE_FOLDER: &str = ".uitestgen/cache";

/// FileCache is an implementation of the Cache trait that stores each entry as a file.
///
/// The cache is organized as: `{folder}/{namespace}/{key}.cache`
/// where namespace is a hash of the generator identity.
#[derive(Debug, Clone)]
pub struct FileCache {
    /// The root folder path for the cache
    folder: String,
    /// Subfolder separating entries of different generators
    namespace: String,
}

impl FileCache {
    /// Creates a new FileCache instance
    ///
    /// # Arguments
    /// * `folder` - Optional root folder path. If None, defaults to [`DEFAULT_CACHE_FOLDER`]
    /// * `namespace` - Subfolder for this cache's entries
    pub fn new(folder: Option<String>, namespace: String) -> Self {
        Self {
            folder: folder.unwrap_or_else(|| DEFAULT_CACHE_FOLDER.to_string()),
            namespace,
        }
    }

    /// Path format: `{folder}/{namespace}/{key}.cache`
    /// Note: The key is expected to be a hash value (hex string), which is already safe for filenames.
    fn get_cache_path(&self, key: &str) -> PathBuf {
        let mut path = self.get_cache_dir();
        path.push(format!("{}.cache", key));
        path
    }

    fn get_cache_dir(&self) -> PathBuf {
        let mut path = PathBuf::from(&self.folder);
        path.push(&self.namespace);
        path
    }
}

impl Cache for FileCache {
    /// A missing or unreadable file is a cache miss.
    fn get(&self, key: &str) -> Option<String> {
        fs::read_to_string(self.get_cache_path(key)).ok()
    }

    /// Creates necessary directories if they don't exist. Errors are logged, not returned.
    fn set(&self, key: &str, value: &str) {
        let path = self.get_cache_path(key);
        let dir = self.get_cache_dir();

        if let Err(e) = fs::create_dir_all(&dir) {
            warn!(dir = %dir.display(), error = %e, "failed to create cache directory");
            return;
        }

        if let Err(e) = fs::write(&path, value) {
            warn!(path = %path.display(), error = %e, "failed to write cache file");
        }
    }
}
