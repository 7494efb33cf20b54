//! Concurrent bulk loader

use std::collections::HashSet;
use std::future::Future;
use std::hash::Hash;
use std::sync::Arc;
use std::time::Instant;

use futures::StreamExt;
use keyloader_errors::{AppError, AppResult};
use keyloader_ports::{
    ItemFetcher, ItemKind, ItemMetadata, ListingEntry, PagedListingSource, SigningHandle,
};
use metrics::{counter, histogram};
use tokio::task::{JoinError, JoinSet};
use tracing::{debug, error, info, warn};

use crate::config::LoaderConfig;
use crate::filter::TagFilter;
use crate::mapper::ItemMapper;
use crate::results::MappedResults;
use crate::unit::{Outcome, run_unit};

/// Loads every vault item matching a tag filter and maps it to domain values.
///
/// Pages are consumed in listing order. Each selected item becomes one tokio
/// task; at most `concurrency` tasks are in flight at once. A load never
/// returns an error: failures are logged and counted in
/// [`MappedResults::error_count`].
pub struct BulkLoader<V: ?Sized> {
    vault: Arc<V>,
    config: LoaderConfig,
}

impl<V: ?Sized> Clone for BulkLoader<V> {
    fn clone(&self) -> Self {
        Self {
            vault: Arc::clone(&self.vault),
            config: self.config.clone(),
        }
    }
}

impl<V> BulkLoader<V>
where
    V: PagedListingSource + ItemFetcher + ?Sized + 'static,
{
    pub fn new(vault: Arc<V>, config: LoaderConfig) -> Self {
        Self { vault, config }
    }

    pub fn config(&self) -> &LoaderConfig {
        &self.config
    }

    /// Load secrets whose tags match `filter`, mapping each raw value
    pub async fn load_secrets<R, M>(&self, filter: &TagFilter, mapper: M) -> MappedResults<R>
    where
        R: Eq + Hash + Send + 'static,
        M: ItemMapper<String, R> + 'static,
    {
        let vault = Arc::clone(&self.vault);
        self.load(ItemKind::Secret, filter, mapper, move |item: ItemMetadata| {
            let vault = Arc::clone(&vault);
            async move { vault.fetch_secret_value(&item.name).await }
        })
        .await
    }

    /// Load keys whose tags match `filter`, mapping each remote signing handle
    pub async fn load_keys<R, M>(&self, filter: &TagFilter, mapper: M) -> MappedResults<R>
    where
        R: Eq + Hash + Send + 'static,
        M: ItemMapper<Arc<dyn SigningHandle>, R> + 'static,
    {
        let vault = Arc::clone(&self.vault);
        self.load(ItemKind::Key, filter, mapper, move |item: ItemMetadata| {
            let vault = Arc::clone(&vault);
            async move {
                vault
                    .fetch_key_handle(&item.name, item.version.as_deref())
                    .await
            }
        })
        .await
    }

    async fn load<I, R, M, F, Fut>(
        &self,
        kind: ItemKind,
        filter: &TagFilter,
        mapper: M,
        fetch: F,
    ) -> MappedResults<R>
    where
        I: Send + 'static,
        R: Eq + Hash + Send + 'static,
        M: ItemMapper<I, R> + 'static,
        F: Fn(ItemMetadata) -> Fut,
        Fut: Future<Output = AppResult<I>> + Send + 'static,
    {
        let started = Instant::now();

        let mut pages = match self.vault.list_items(kind).await {
            Ok(pages) => pages,
            Err(e) => {
                error!(kind = %kind, error = %e, "Failed to list vault items, aborting load");
                counter!("keyloader_listing_failures_total", "kind" => kind.as_str()).increment(1);
                return MappedResults::new(HashSet::new(), 1);
            }
        };

        let mapper = Arc::new(mapper);
        let timeout = self.config.fetch_timeout();
        let limit = self.config.worker_limit();
        let mut units: JoinSet<Outcome<R>> = JoinSet::new();
        let mut acc = Accumulator::new(kind);
        let mut page_index = 0usize;

        while let Some(page) = pages.next().await {
            let page = match page {
                Ok(page) => page,
                Err(e) => {
                    error!(
                        kind = %kind,
                        page = page_index,
                        error = %e,
                        "Vault listing failed mid-traversal, stopping"
                    );
                    counter!("keyloader_listing_failures_total", "kind" => kind.as_str())
                        .increment(1);
                    acc.error_count += 1;
                    break;
                }
            };

            let listed = page.len();
            let mut selected = 0usize;

            for entry in page {
                let item = match entry {
                    ListingEntry::Item(item) => item,
                    ListingEntry::Unreadable { name, error } => {
                        acc.unreadable(&name, &error);
                        continue;
                    }
                };
                if !filter.matches(item.tags.as_ref()) {
                    continue;
                }
                selected += 1;

                while units.len() >= limit {
                    if let Some(joined) = units.join_next().await {
                        acc.absorb(joined);
                    }
                }

                let name = item.name.clone();
                units.spawn(run_unit(name, fetch(item), Arc::clone(&mapper), timeout));
            }

            debug!(kind = %kind, page = page_index, listed, selected, "Dispatched vault page");
            page_index += 1;
        }

        while let Some(joined) = units.join_next().await {
            acc.absorb(joined);
        }

        let results = acc.finish();
        histogram!("keyloader_load_duration_seconds", "kind" => kind.as_str())
            .record(started.elapsed().as_secs_f64());
        info!(
            kind = %kind,
            pages = page_index,
            loaded = results.len(),
            failed = results.error_count(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Vault bulk load finished"
        );

        results
    }
}

/// Folds unit outcomes as they complete. Owned by the orchestrating task only.
struct Accumulator<R> {
    kind: ItemKind,
    values: HashSet<R>,
    error_count: usize,
}

impl<R: Eq + Hash> Accumulator<R> {
    fn new(kind: ItemKind) -> Self {
        Self {
            kind,
            values: HashSet::new(),
            error_count: 0,
        }
    }

    fn absorb(&mut self, joined: Result<Outcome<R>, JoinError>) {
        match joined {
            Ok(Outcome::Produced(values)) => {
                counter!("keyloader_items_loaded_total", "kind" => self.kind.as_str())
                    .increment(1);
                self.values.extend(values);
            }
            Ok(Outcome::Failed(e)) => {
                counter!(
                    "keyloader_items_failed_total",
                    "kind" => self.kind.as_str(),
                    "reason" => e.kind()
                )
                .increment(1);
                self.error_count += 1;
            }
            Err(e) => {
                // run_unit catches panics, so only cancellation lands here
                warn!(kind = %self.kind, error = %e, "Vault load task aborted");
                counter!(
                    "keyloader_items_failed_total",
                    "kind" => self.kind.as_str(),
                    "reason" => "aborted"
                )
                .increment(1);
                self.error_count += 1;
            }
        }
    }

    /// Listed entry whose metadata could not be read; its tags are unknown
    fn unreadable(&mut self, name: &str, error: &AppError) {
        warn!(
            kind = %self.kind,
            item = %name,
            error = %error,
            "Vault item metadata unreadable, counting as failed"
        );
        counter!(
            "keyloader_items_failed_total",
            "kind" => self.kind.as_str(),
            "reason" => error.kind()
        )
        .increment(1);
        self.error_count += 1;
    }

    fn finish(self) -> MappedResults<R> {
        MappedResults::new(self.values, self.error_count)
    }
}
