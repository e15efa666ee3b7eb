//! Append-only stores for offers, anomaly records and HTML snapshots.

use async_trait::async_trait;
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use tokio::fs::{self, File};
use tokio::io::AsyncWriteExt;
use url::Url;

use crate::error::StoreError;
use crate::model::{AnomalyRecord, OfferRecord};

pub const HTML_CONTENT_TYPE: &str = "text/html";

#[async_trait]
pub trait OfferStore: Send + Sync {
    /// Append one product page's offers.
    async fn append(&self, offers: &[OfferRecord]) -> Result<(), StoreError>;
}

#[async_trait]
pub trait AnomalyStore: Send + Sync {
    async fn append(&self, record: &AnomalyRecord) -> Result<(), StoreError>;
}

#[async_trait]
pub trait SnapshotStore: Send + Sync {
    /// Store `content` under `key` and return where it can be found.
    async fn put(&self, key: &str, content: &str, content_type: &str) -> Result<String, StoreError>;
}

/// Maps a stored record key to the location embedded in anomaly records.
pub trait SnapshotLocator: Send + Sync {
    fn locate(&self, record_key: &str) -> String;
}

/// Stores a crawl writes to, shared by every job.
#[derive(Clone)]
pub struct Storage {
    pub offers: Arc<dyn OfferStore>,
    pub anomalies: Arc<dyn AnomalyStore>,
    pub snapshots: Arc<dyn SnapshotStore>,
}

/// Name of the stored record for a snapshot key.
pub fn record_key(key: &str, content_type: &str) -> String {
    let extension = match content_type {
        HTML_CONTENT_TYPE => "html",
        "application/json" => "json",
        _ => "bin",
    };
    format!("{key}.{extension}")
}

// ---------------------------------------------------------------------------
// Snapshot locations
// ---------------------------------------------------------------------------

pub struct LocalPathLocator {
    root: PathBuf,
}

impl LocalPathLocator {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

impl SnapshotLocator for LocalPathLocator {
    fn locate(&self, record_key: &str) -> String {
        key_value_dir(&self.root).join(record_key).display().to_string()
    }
}

/// Locations for deployments that serve the snapshot directory over HTTP.
pub struct RemoteLocator {
    base_url: Url,
}

impl RemoteLocator {
    pub fn new(base_url: Url) -> Self {
        Self { base_url }
    }
}

impl SnapshotLocator for RemoteLocator {
    fn locate(&self, record_key: &str) -> String {
        format!(
            "{}/records/{}",
            self.base_url.as_str().trim_end_matches('/'),
            record_key
        )
    }
}

fn key_value_dir(root: &Path) -> PathBuf {
    root.join("key_value_stores")
}

// ---------------------------------------------------------------------------
// File-backed stores
// ---------------------------------------------------------------------------

/// Dataset written as one JSON document per line.
pub struct JsonLinesDataset {
    path: PathBuf,
    file: tokio::sync::Mutex<File>,
}

impl JsonLinesDataset {
    /// Create (or truncate) the dataset file.
    pub async fn create(path: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let path = path.into();
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).await?;
        }
        let file = File::create(&path).await?;
        Ok(Self {
            path,
            file: tokio::sync::Mutex::new(file),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn write_lines<T: Serialize>(&self, items: &[T]) -> Result<(), StoreError> {
        if items.is_empty() {
            return Ok(());
        }
        let mut buffer = Vec::new();
        for item in items {
            serde_json::to_writer(&mut buffer, item)?;
            buffer.push(b'\n');
        }
        let mut file = self.file.lock().await;
        file.write_all(&buffer).await?;
        file.flush().await?;
        Ok(())
    }
}

#[async_trait]
impl OfferStore for JsonLinesDataset {
    async fn append(&self, offers: &[OfferRecord]) -> Result<(), StoreError> {
        self.write_lines(offers).await
    }
}

#[async_trait]
impl AnomalyStore for JsonLinesDataset {
    async fn append(&self, record: &AnomalyRecord) -> Result<(), StoreError> {
        self.write_lines(std::slice::from_ref(record)).await
    }
}

/// Read back every offer written to a JSON-lines dataset.
pub async fn read_offers(path: &Path) -> Result<Vec<OfferRecord>, StoreError> {
    let content = fs::read_to_string(path).await?;
    content
        .lines()
        .filter(|line| !line.trim().is_empty())
        .map(|line| serde_json::from_str(line).map_err(StoreError::from))
        .collect()
}

pub struct FileSnapshotStore {
    root: PathBuf,
    locator: Box<dyn SnapshotLocator>,
}

impl FileSnapshotStore {
    pub fn new(root: impl Into<PathBuf>, locator: Box<dyn SnapshotLocator>) -> Self {
        Self {
            root: root.into(),
            locator,
        }
    }
}

#[async_trait]
impl SnapshotStore for FileSnapshotStore {
    async fn put(&self, key: &str, content: &str, content_type: &str) -> Result<String, StoreError> {
        let record = record_key(key, content_type);
        let dir = key_value_dir(&self.root);
        fs::create_dir_all(&dir).await?;
        fs::write(dir.join(&record), content).await?;
        Ok(self.locator.locate(&record))
    }
}

// ---------------------------------------------------------------------------
// In-memory stores
// ---------------------------------------------------------------------------

#[derive(Default)]
pub struct MemoryDataset {
    offers: Mutex<Vec<OfferRecord>>,
    appends: Mutex<usize>,
    anomalies: Mutex<Vec<AnomalyRecord>>,
}

impl MemoryDataset {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn offers(&self) -> Vec<OfferRecord> {
        lock(&self.offers).clone()
    }

    /// Number of `OfferStore::append` calls, including empty ones.
    pub fn append_calls(&self) -> usize {
        *lock(&self.appends)
    }

    pub fn anomalies(&self) -> Vec<AnomalyRecord> {
        lock(&self.anomalies).clone()
    }
}

#[async_trait]
impl OfferStore for MemoryDataset {
    async fn append(&self, offers: &[OfferRecord]) -> Result<(), StoreError> {
        *lock(&self.appends) += 1;
        lock(&self.offers).extend_from_slice(offers);
        Ok(())
    }
}

#[async_trait]
impl AnomalyStore for MemoryDataset {
    async fn append(&self, record: &AnomalyRecord) -> Result<(), StoreError> {
        lock(&self.anomalies).push(record.clone());
        Ok(())
    }
}

#[derive(Default)]
pub struct MemorySnapshotStore {
    snapshots: Mutex<Vec<(String, String)>>,
}

impl MemorySnapshotStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &str) -> Option<String> {
        lock(&self.snapshots)
            .iter()
            .find(|(stored, _)| stored == key)
            .map(|(_, content)| content.clone())
    }

    pub fn keys(&self) -> Vec<String> {
        lock(&self.snapshots).iter().map(|(key, _)| key.clone()).collect()
    }
}

#[async_trait]
impl SnapshotStore for MemorySnapshotStore {
    async fn put(&self, key: &str, content: &str, content_type: &str) -> Result<String, StoreError> {
        lock(&self.snapshots).push((key.to_string(), content.to_string()));
        Ok(format!("memory://{}", record_key(key, content_type)))
    }
}

// A poisoned lock only means another writer panicked mid-push; the data is
// still append-only and usable.
fn lock<T>(mutex: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}
