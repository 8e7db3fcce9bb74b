//! Bounded worker pool over the deduped URL list.
//!
//! A semaphore caps in-flight checks; a new URL is admitted the moment a
//! slot frees, not on a fixed schedule. Results are collected append-only as
//! they complete and re-sorted by input index, so the report order is
//! deterministic regardless of which checks finish first.

use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use futures::FutureExt;
use futures::stream::FuturesUnordered;
use futures_util::StreamExt;
use tokio::sync::Semaphore;
use tracing::{debug, error, info};

use crate::checker::{CheckResult, PageProbe, check_url};
use crate::config::CheckConfig;
use crate::oracle::ParkedOracle;
use crate::status::Status;

/// Run every URL through the orchestrator, at most `concurrency` at a time.
///
/// Each check owns its own tab; the browser session behind `probe` is the
/// only shared resource. A panicking check is contained and recorded as an
/// `Other` row, never aborting its siblings.
pub async fn run_checks<P, O>(
    urls: Vec<String>,
    probe: Arc<P>,
    oracle: Arc<O>,
    config: &CheckConfig,
) -> Vec<CheckResult>
where
    P: PageProbe + 'static,
    O: ParkedOracle + 'static,
{
    let total = urls.len();
    info!(total, concurrency = config.concurrency(), "starting batch");

    let semaphore = Arc::new(Semaphore::new(config.concurrency()));
    let mut active_tasks = FuturesUnordered::new();

    for (index, url) in urls.into_iter().enumerate() {
        // Permits provide the backpressure: spawning blocks here until a
        // running check releases its slot.
        let Ok(permit) = semaphore.clone().acquire_owned().await else {
            error!("semaphore closed unexpectedly");
            break;
        };

        let probe = Arc::clone(&probe);
        let oracle = Arc::clone(&oracle);
        let config = config.clone();

        let task = tokio::spawn(async move {
            let _permit = permit;
            let outcome =
                AssertUnwindSafe(check_url(&url, probe.as_ref(), oracle.as_ref(), &config))
                    .catch_unwind()
                    .await;
            let result = outcome.unwrap_or_else(|_| {
                error!(url, "check panicked");
                CheckResult {
                    url: url.clone(),
                    status: Status::Other,
                    note: "internal fault: check panicked".to_string(),
                    error_detail: None,
                }
            });
            (index, result)
        });
        active_tasks.push(task);
    }

    let mut indexed: Vec<(usize, CheckResult)> = Vec::with_capacity(total);
    while let Some(joined) = active_tasks.next().await {
        match joined {
            Ok((index, result)) => {
                debug!(
                    url = %result.url,
                    status = %result.status,
                    done = indexed.len() + 1,
                    total,
                    "check complete"
                );
                indexed.push((index, result));
            }
            Err(e) => {
                // Panics are caught inside the task; this is abort/shutdown
                // territory and the row is unrecoverable.
                error!("check task failed to join: {e}");
            }
        }
    }

    indexed.sort_by_key(|(index, _)| *index);
    indexed.into_iter().map(|(_, result)| result).collect()
}
