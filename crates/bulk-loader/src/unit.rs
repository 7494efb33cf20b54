//! Per-item unit of work and its failure boundary

use std::any::Any;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Duration;

use futures::FutureExt;
use keyloader_errors::{AppError, AppResult};
use tracing::{debug, warn};

use crate::mapper::ItemMapper;

/// Result of processing one selected item
#[derive(Debug)]
pub enum Outcome<R> {
    /// Fetch and map succeeded; may hold zero, one or many values
    Produced(Vec<R>),
    /// Fetch, mapping, timeout or panic
    Failed(AppError),
}

impl<R> Outcome<R> {
    pub fn is_failed(&self) -> bool {
        matches!(self, Self::Failed(_))
    }
}

/// Fetch an item and map it, turning every failure into [`Outcome::Failed`].
///
/// Nothing escapes this function: errors and panics in the fetch or the
/// mapper are logged with the item name and returned as a value so sibling
/// units are unaffected.
pub(crate) async fn run_unit<I, R, M, Fut>(
    name: String,
    fetch: Fut,
    mapper: Arc<M>,
    timeout: Option<Duration>,
) -> Outcome<R>
where
    M: ItemMapper<I, R> + ?Sized,
    Fut: Future<Output = AppResult<I>>,
{
    let work = async {
        let fetched = match timeout {
            Some(limit) => match tokio::time::timeout(limit, fetch).await {
                Ok(result) => result,
                Err(_) => Err(AppError::timeout(format!(
                    "fetch did not complete within {}ms",
                    limit.as_millis()
                ))),
            },
            None => fetch.await,
        };
        fetched.and_then(|input| mapper.map(&name, input))
    };

    let result = match AssertUnwindSafe(work).catch_unwind().await {
        Ok(result) => result,
        Err(payload) => Err(AppError::internal(format!(
            "unit panicked: {}",
            panic_message(&*payload)
        ))),
    };

    match result {
        Ok(values) => {
            debug!(item = %name, produced = values.len(), "Vault item loaded");
            Outcome::Produced(values)
        }
        Err(e) => {
            warn!(item = %name, kind = e.kind(), error = %e, "Failed to load vault item");
            Outcome::Failed(e)
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    if let Some(message) = payload.downcast_ref::<&str>() {
        *message
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.as_str()
    } else {
        "non-string panic payload"
    }
}
