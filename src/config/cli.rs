use crate::core::Storage;
use crate::utils::error::Result;
use std::fs;
use std::path::Path;

/// Storage over two local directories: cached responses are read from
/// `cache_dir`, flushed batches land in `save_dir`.
#[derive(Debug, Clone)]
pub struct LocalStorage {
    cache_dir: String,
    save_dir: String,
}

impl LocalStorage {
    pub fn new(cache_dir: String, save_dir: String) -> Self {
        Self {
            cache_dir,
            save_dir,
        }
    }
}

impl Storage for LocalStorage {
    /// Sorted so repeated runs see the files in the same order.
    async fn list_files(&self) -> Result<Vec<String>> {
        let mut files = Vec::new();
        for entry in fs::read_dir(&self.cache_dir)? {
            let entry = entry?;
            if entry.file_type()?.is_file() {
                files.push(entry.file_name().to_string_lossy().into_owned());
            }
        }
        files.sort();
        Ok(files)
    }

    async fn read_file(&self, name: &str) -> Result<Vec<u8>> {
        let full_path = Path::new(&self.cache_dir).join(name);
        let data = fs::read(full_path)?;
        Ok(data)
    }

    async fn write_file(&self, name: &str, data: &[u8]) -> Result<()> {
        let full_path = Path::new(&self.save_dir).join(name);

        if let Some(parent) = full_path.parent() {
            fs::create_dir_all(parent)?;
        }

        fs::write(full_path, data)?;
        Ok(())
    }
}
