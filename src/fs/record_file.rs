use std::{
    future::Future,
    io::ErrorKind,
    path::{Path, PathBuf},
};

use anyhow::{Context, Result};
use fs4::tokio::AsyncFileExt;
use tokio::{
    fs::File,
    io::{AsyncReadExt, AsyncWriteExt},
};
use tracing::{debug, info, instrument};

use crate::{
    storage::codec::{deserialize_all, serialize},
    tracking::collection::RecordCollection,
};

/// Interface for abstracting where records are kept between runs.
pub trait RecordStorage {
    /// Reads every stored record. Either all records come back or an error does, a partially read
    /// collection is never returned.
    fn load(&self) -> impl Future<Output = Result<RecordCollection>> + Send;

    /// Replaces stored records with `records`.
    fn save(&self, records: &RecordCollection) -> impl Future<Output = Result<()>> + Send;
}

/// The main realization of [RecordStorage]: a single text file in the format of
/// [crate::storage::codec].
#[derive(Debug, Clone)]
pub struct RecordFile {
    path: PathBuf,
    max_category_length: usize,
}

impl RecordFile {
    pub fn new(path: PathBuf, max_category_length: usize) -> Self {
        Self {
            path,
            max_category_length,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn read_text(&self) -> std::result::Result<String, std::io::Error> {
        let mut file = File::open(&self.path).await?;
        file.lock_shared()?;
        let mut text = String::new();
        let result = file.read_to_string(&mut text).await;
        file.unlock_async().await?;
        result.map(|_| text)
    }
}

impl RecordStorage for RecordFile {
    #[instrument(skip(self), fields(path = ?self.path))]
    async fn load(&self) -> Result<RecordCollection> {
        let text = match self.read_text().await {
            Ok(text) => text,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!("No record file yet, starting empty");
                return Ok(RecordCollection::new());
            }
            Err(e) => {
                return Err(e).with_context(|| format!("Failed to read {:?}", self.path));
            }
        };

        let records = deserialize_all(&text, self.max_category_length)
            .with_context(|| format!("Failed to parse records in {:?}", self.path))?;
        debug!("Loaded {} records", records.len());
        Ok(records)
    }

    #[instrument(skip(self, records), fields(path = ?self.path, count = records.len()))]
    async fn save(&self, records: &RecordCollection) -> Result<()> {
        let content = serialize(records);

        let mut file = File::options()
            .write(true)
            .create(true)
            .truncate(false)
            .open(&self.path)
            .await
            .with_context(|| format!("Failed to open {:?}", self.path))?;

        // Truncate only once the lock is held, so readers never see a half written file.
        file.lock_exclusive()?;
        let result = write_all(&mut file, content.as_bytes()).await;
        file.unlock_async().await?;
        result.with_context(|| format!("Failed to write {:?}", self.path))?;

        info!("Saved {} records", records.len());
        Ok(())
    }
}

async fn write_all(file: &mut File, content: &[u8]) -> std::result::Result<(), std::io::Error> {
    file.set_len(0).await?;
    file.write_all(content).await?;
    file.flush().await?;
    file.sync_all().await
}
