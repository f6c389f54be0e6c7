use std::path::Path;

use async_trait::async_trait;
use mockall::automock;
use tokio::{
    fs::File,
    io::{AsyncReadExt, AsyncWriteExt},
};

/// Persistence port for the serialized session blob. `get` returns `None`
/// when nothing is stored, absence is not an error.
#[automock]
#[async_trait]
pub trait SessionStorage: Send + Sync {
    async fn set(&self, blob: String) -> Result<(), Box<dyn std::error::Error + Send + Sync>>;
    async fn get(&self) -> Result<Option<String>, Box<dyn std::error::Error + Send + Sync>>;
    async fn remove(&self) -> Result<(), Box<dyn std::error::Error + Send + Sync>>;
}

#[derive(Clone)]
pub struct FileSystemStorage {
    path: String,
}

impl FileSystemStorage {
    pub fn new(data_dir: String) -> Self {
        let path = FileSystemStorage::get_session_file_path(data_dir);
        Self { path }
    }

    pub fn get_session_file_path(data_dir: String) -> String {
        let sep = if cfg!(windows) { '\\' } else { '/' };
        format!("{}{}{}", data_dir, sep, "session.json")
    }
}

#[async_trait]
impl SessionStorage for FileSystemStorage {
    async fn set(&self, blob: String) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        let path = Path::new(&self.path);

        if path.exists() {
            match std::fs::remove_file(path) {
                Err(e) => return Err(Box::new(e)),
                _ => {}
            };
        }

        let mut file = match File::create(path).await {
            Err(e) => return Err(Box::new(e)),
            Ok(f) => f,
        };

        match file.write_all(blob.as_bytes()).await {
            Err(e) => {
                match file.shutdown().await {
                    Err(e) => return Err(Box::new(e)),
                    _ => {}
                };
                return Err(Box::new(e));
            }
            _ => {}
        }

        match file.shutdown().await {
            Err(e) => return Err(Box::new(e)),
            _ => {}
        };

        Ok(())
    }

    async fn get(&self) -> Result<Option<String>, Box<dyn std::error::Error + Send + Sync>> {
        let path = Path::new(self.path.as_str());

        if !path.exists() {
            return Ok(None);
        }

        let mut file = match File::open(&self.path).await {
            Err(e) => return Err(Box::new(e)),
            Ok(f) => f,
        };

        let mut buffer = vec![];

        match file.read_to_end(&mut buffer).await {
            Err(e) => return Err(Box::new(e)),
            _ => {}
        };

        let blob = match String::from_utf8(buffer) {
            Err(e) => return Err(Box::new(e)),
            Ok(s) => s,
        };

        Ok(Some(blob.trim().to_string()))
    }

    async fn remove(&self) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        let path = Path::new(self.path.as_str());

        if !path.exists() {
            return Ok(());
        }

        match tokio::fs::remove_file(path).await {
            Err(e) => Err(Box::new(e)),
            Ok(_) => Ok(()),
        }
    }
}
