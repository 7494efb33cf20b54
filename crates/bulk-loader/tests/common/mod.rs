//! In-memory vault used by the loader integration tests

#![allow(dead_code)]

use std::collections::{HashMap, HashSet};
use std::io;
use std::sync::Arc;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use futures::StreamExt;
use futures::stream;
use keyloader_errors::{AppError, AppResult};
use tracing_subscriber::fmt::MakeWriter;
use keyloader_ports::{
    ItemFetcher, ItemKind, ItemMetadata, ListingEntry, PageStream, PagedListingSource,
    SigningHandle,
};

/// Vault double with configurable paging and failure injection
#[derive(Default)]
pub struct MemoryVault {
    secrets: Vec<ListingEntry>,
    values: HashMap<String, String>,
    keys: Vec<ItemMetadata>,
    page_size: usize,
    fail_listing: bool,
    fail_page: Option<usize>,
    fetch_delay: Option<Duration>,
    hanging: HashSet<String>,
    fetched: Mutex<Vec<String>>,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
}

impl MemoryVault {
    pub fn new() -> Self {
        Self {
            page_size: 25,
            ..Default::default()
        }
    }

    pub fn secret(mut self, item: ItemMetadata, value: impl Into<String>) -> Self {
        self.values.insert(item.name.clone(), value.into());
        self.secrets.push(item.into());
        self
    }

    /// Listed but deleted before it could be read
    pub fn dangling_secret(mut self, item: ItemMetadata) -> Self {
        self.secrets.push(item.into());
        self
    }

    /// Listed but its metadata read is denied
    pub fn unreadable_secret(mut self, name: &str) -> Self {
        self.secrets.push(ListingEntry::unreadable(
            name,
            AppError::forbidden(format!("metadata of '{}'", name)),
        ));
        self
    }

    pub fn key(mut self, item: ItemMetadata) -> Self {
        self.keys.push(item);
        self
    }

    pub fn page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size;
        self
    }

    pub fn failing_listing(mut self) -> Self {
        self.fail_listing = true;
        self
    }

    /// Pages from `index` onwards cannot be retrieved
    pub fn failing_page(mut self, index: usize) -> Self {
        self.fail_page = Some(index);
        self
    }

    pub fn fetch_delay(mut self, delay: Duration) -> Self {
        self.fetch_delay = Some(delay);
        self
    }

    pub fn hanging(mut self, name: &str) -> Self {
        self.hanging.insert(name.to_string());
        self
    }

    pub fn into_shared(self) -> Arc<Self> {
        Arc::new(self)
    }

    /// Names passed to any fetch call, sorted
    pub fn fetched(&self) -> Vec<String> {
        let mut names = self.fetched.lock().unwrap().clone();
        names.sort();
        names
    }

    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }

    async fn enter_fetch(&self, name: &str) {
        self.fetched.lock().unwrap().push(name.to_string());

        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);

        if self.hanging.contains(name) {
            std::future::pending::<()>().await;
        }
        if let Some(delay) = self.fetch_delay {
            tokio::time::sleep(delay).await;
        }

        self.in_flight.fetch_sub(1, Ordering::SeqCst);
    }
}

#[async_trait]
impl PagedListingSource for MemoryVault {
    async fn list_items(&self, kind: ItemKind) -> AppResult<PageStream> {
        if self.fail_listing {
            return Err(AppError::unauthenticated("token rejected"));
        }

        let items: Vec<ListingEntry> = match kind {
            ItemKind::Secret => self.secrets.clone(),
            ItemKind::Key => self.keys.iter().cloned().map(ListingEntry::from).collect(),
        };

        let fail_page = self.fail_page;
        let pages: Vec<AppResult<Vec<ListingEntry>>> = items
            .chunks(self.page_size.max(1))
            .enumerate()
            .map(|(index, chunk)| match fail_page {
                Some(failing) if index >= failing => {
                    Err(AppError::external_service("connection reset"))
                }
                _ => Ok(chunk.to_vec()),
            })
            .collect();

        Ok(stream::iter(pages).boxed())
    }
}

#[async_trait]
impl ItemFetcher for MemoryVault {
    async fn fetch_secret_value(&self, name: &str) -> AppResult<String> {
        self.enter_fetch(name).await;
        self.values
            .get(name)
            .cloned()
            .ok_or_else(|| AppError::not_found(format!("secret '{}'", name)))
    }

    async fn fetch_key_handle(
        &self,
        name: &str,
        version: Option<&str>,
    ) -> AppResult<Arc<dyn SigningHandle>> {
        self.enter_fetch(name).await;
        if !self.keys.iter().any(|key| key.name == name) {
            return Err(AppError::not_found(format!("key '{}'", name)));
        }

        let key_id = match version {
            Some(version) => format!("memory/{}/{}", name, version),
            None => format!("memory/{}", name),
        };
        Ok(Arc::new(MemoryHandle { key_id }))
    }
}

#[derive(Debug)]
pub struct MemoryHandle {
    key_id: String,
}

#[async_trait]
impl SigningHandle for MemoryHandle {
    fn key_id(&self) -> &str {
        &self.key_id
    }

    async fn sign(&self, data: &[u8]) -> AppResult<String> {
        Ok(format!("{}:{}", self.key_id, String::from_utf8_lossy(data)))
    }

    async fn verify(&self, data: &[u8], signature: &str) -> AppResult<bool> {
        Ok(self.sign(data).await? == signature)
    }
}

pub fn tagged(name: &str, pairs: &[(&str, &str)]) -> ItemMetadata {
    pairs
        .iter()
        .fold(ItemMetadata::new(name), |item, (k, v)| item.with_tag(*k, *v))
}

/// In-memory sink for log output written by a test subscriber
#[derive(Clone, Default)]
pub struct LogBuffer(Arc<Mutex<Vec<u8>>>);

impl LogBuffer {
    /// Install a WARN-level subscriber writing here for the current thread
    pub fn capture(&self) -> tracing::subscriber::DefaultGuard {
        let subscriber = tracing_subscriber::fmt()
            .with_writer(self.clone())
            .with_ansi(false)
            .with_max_level(tracing::Level::WARN)
            .finish();
        tracing::subscriber::set_default(subscriber)
    }

    pub fn lines(&self) -> Vec<String> {
        String::from_utf8_lossy(&self.0.lock().unwrap())
            .lines()
            .map(str::to_string)
            .collect()
    }
}

impl io::Write for LogBuffer {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl<'a> MakeWriter<'a> for LogBuffer {
    type Writer = LogBuffer;

    fn make_writer(&'a self) -> Self::Writer {
        self.clone()
    }
}
