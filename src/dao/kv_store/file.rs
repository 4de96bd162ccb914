use std::{
    io::ErrorKind,
    path::{Path, PathBuf},
    sync::Arc,
};

use futures::future::BoxFuture;
use tokio::fs;

use crate::dao::{
    kv_store::KeyValueStore,
    storage::{StorageError, StorageResult},
};

const FILE_EXTENSION: &str = "json";

/// [`KeyValueStore`] persisting each key as a JSON file inside a directory.
#[derive(Clone)]
pub struct FileStore {
    root: Arc<PathBuf>,
}

impl FileStore {
    /// Open the store, creating the directory when needed.
    pub async fn open(root: impl Into<PathBuf>) -> StorageResult<Self> {
        let root = root.into();
        fs::create_dir_all(&root).await.map_err(|source| {
            StorageError::unavailable(
                format!("cannot create storage directory `{}`", root.display()),
                source,
            )
        })?;

        Ok(Self {
            root: Arc::new(root),
        })
    }

    /// Directory holding the files.
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn path_for(&self, key: &str) -> PathBuf {
        let file_name: String = key
            .chars()
            .map(|c| {
                if c.is_ascii_alphanumeric() || c == '_' || c == '-' {
                    c
                } else {
                    '_'
                }
            })
            .collect();
        self.root.join(format!("{file_name}.{FILE_EXTENSION}"))
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> BoxFuture<'static, StorageResult<Option<String>>> {
        let path = self.path_for(key);
        Box::pin(async move {
            match fs::read_to_string(&path).await {
                Ok(contents) => Ok(Some(contents)),
                Err(err) if err.kind() == ErrorKind::NotFound => Ok(None),
                Err(err) => Err(StorageError::unavailable(
                    format!("cannot read `{}`", path.display()),
                    err,
                )),
            }
        })
    }

    fn set(&self, key: &str, value: String) -> BoxFuture<'static, StorageResult<()>> {
        let key = key.to_owned();
        let path = self.path_for(&key);
        Box::pin(async move {
            // Write beside the target then rename so readers never see a torn file.
            let staging = path.with_extension("tmp");
            fs::write(&staging, value.as_bytes())
                .await
                .map_err(|source| {
                    StorageError::write(
                        key.clone(),
                        format!("cannot write `{}`", staging.display()),
                        source,
                    )
                })?;
            fs::rename(&staging, &path).await.map_err(|source| {
                StorageError::write(key, format!("cannot replace `{}`", path.display()), source)
            })
        })
    }

    fn remove(&self, key: &str) -> BoxFuture<'static, StorageResult<()>> {
        let key = key.to_owned();
        let path = self.path_for(&key);
        Box::pin(async move {
            match fs::remove_file(&path).await {
                Ok(()) => Ok(()),
                Err(err) if err.kind() == ErrorKind::NotFound => Ok(()),
                Err(err) => Err(StorageError::write(
                    key,
                    format!("cannot remove `{}`", path.display()),
                    err,
                )),
            }
        })
    }

    fn health_check(&self) -> BoxFuture<'static, StorageResult<()>> {
        let root = Arc::clone(&self.root);
        Box::pin(async move {
            let metadata = fs::metadata(root.as_path()).await.map_err(|source| {
                StorageError::unavailable(
                    format!("storage directory `{}` is unreachable", root.display()),
                    source,
                )
            })?;

            if metadata.is_dir() {
                Ok(())
            } else {
                Err(StorageError::unavailable(
                    format!("`{}` is not a directory", root.display()),
                    std::io::Error::from(ErrorKind::NotADirectory),
                ))
            }
        })
    }
}
