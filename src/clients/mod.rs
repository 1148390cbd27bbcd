//! Typed clients for the four downstream integrations: the cluster API, the
//! metrics backend, the coordination service, and ML inference. Each models
//! the "interface with optional nil receiver" pattern as an explicit
//! enabled/disabled variant instead, per the redesign in the design notes.

pub mod cluster;
pub mod coordination;
pub mod inference;
pub mod metrics;

/// Shared exponential-backoff retry loop used by the cluster and
/// coordination clients, generalizing `platform::api::client`'s
/// `MAX_RETRIES`/`INITIAL_BACKOFF_MS`/`MAX_BACKOFF_MS` constants.
pub(crate) const MAX_RETRIES: u32 = 3;
pub(crate) const INITIAL_BACKOFF_MS: u64 = 500;
pub(crate) const MAX_BACKOFF_MS: u64 = 5000;

/// Executes `op` up to `MAX_RETRIES + 1` times with exponential backoff,
/// retrying only when `is_retryable` returns true for the error produced.
pub(crate) async fn with_retry<T, E, F, Fut, R>(mut op: F, is_retryable: R) -> Result<T, E>
where
    F: FnMut() -> Fut,
    Fut: std::future::Future<Output = Result<T, E>>,
    R: Fn(&E) -> bool,
{
    let mut backoff_ms = INITIAL_BACKOFF_MS;
    let mut attempt = 0;
    loop {
        match op().await {
            Ok(value) => return Ok(value),
            Err(err) if attempt < MAX_RETRIES && is_retryable(&err) => {
                attempt += 1;
                tokio::time::sleep(std::time::Duration::from_millis(backoff_ms)).await;
                backoff_ms = (backoff_ms * 2).min(MAX_BACKOFF_MS);
            }
            Err(err) => return Err(err),
        }
    }
}
