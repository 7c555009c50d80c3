//! Polling with exponential backoff on network failures
//!
//! "Not ready yet" is polled at a fixed pace for as long as it takes, while
//! consecutive network failures are bounded by a retry budget.

use std::future::Future;
use std::time::Duration;

use tracing::{debug, warn};

use crate::errors::CliError;

/// Poller options
#[derive(Debug, Clone)]
pub struct PollerOptions {
    /// Delay between two polls returning "not ready yet"
    pub polling_delay: Duration,

    /// Base delay of the backoff after a network failure
    pub init_retry_timeout: Duration,

    /// Multiplier applied per consecutive failure
    pub backoff_factor: f64,

    /// Consecutive network failures tolerated before giving up
    pub max_retry_count: u32,
}

impl Default for PollerOptions {
    fn default() -> Self {
        Self {
            polling_delay: Duration::from_millis(5000),
            init_retry_timeout: Duration::from_millis(1500),
            backoff_factor: 1.25,
            max_retry_count: 5,
        }
    }
}

/// Upper bound of a single backoff delay
pub const MAX_RETRY_DELAY: Duration = Duration::from_secs(300);

/// Delay to wait after the `fail_count`-th consecutive network failure,
/// capped at [`MAX_RETRY_DELAY`]
pub fn calc_exp_backoff(options: &PollerOptions, fail_count: u32) -> Duration {
    let delay_secs =
        options.init_retry_timeout.as_secs_f64() * options.backoff_factor.powi(fail_count as i32);
    Duration::try_from_secs_f64(delay_secs)
        .map(|delay| delay.min(MAX_RETRY_DELAY))
        .unwrap_or(MAX_RETRY_DELAY)
}

/// Call `probe` until it yields a value.
///
/// `Ok(None)` means "not ready yet": wait `polling_delay` and poll again.
/// Transient network errors are retried with an exponential backoff, up to
/// `max_retry_count` in a row; any successful call resets that count.
/// Other errors are returned as is.
pub async fn wait_for<T, P, PF, S, SF>(
    options: &PollerOptions,
    sleep_fn: &S,
    mut probe: P,
) -> Result<T, CliError>
where
    P: FnMut() -> PF,
    PF: Future<Output = Result<Option<T>, CliError>>,
    S: Fn(Duration) -> SF,
    SF: Future<Output = ()>,
{
    let mut fail_count: u32 = 0;

    loop {
        match probe().await {
            Ok(Some(result)) => return Ok(result),
            Ok(None) => {
                fail_count = 0;
                sleep_fn(options.polling_delay).await;
            }
            Err(e) if e.is_transient() => {
                fail_count += 1;
                if fail_count > options.max_retry_count {
                    return Err(CliError::RetriesExhausted(options.max_retry_count));
                }

                let delay = calc_exp_backoff(options, fail_count);
                warn!("Network failure ({}), retry #{} in {:?}", e, fail_count, delay);
                sleep_fn(delay).await;
            }
            Err(e) => {
                debug!("Polling stopped: {}", e);
                return Err(e);
            }
        }
    }
}
