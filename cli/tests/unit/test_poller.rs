//! Backoff poller tests

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use clever_cli::errors::CliError;
use clever_cli::watch::poller::{calc_exp_backoff, wait_for, PollerOptions};

use crate::fakes::{network_error, SleepRecorder};

type Script = Arc<Mutex<VecDeque<Result<Option<u32>, CliError>>>>;

fn script(steps: Vec<Result<Option<u32>, CliError>>) -> Script {
    Arc::new(Mutex::new(steps.into()))
}

async fn run(options: &PollerOptions, sleeper: &SleepRecorder, script: &Script) -> Result<u32, CliError> {
    let sleep_fn = sleeper.sleep_fn();
    wait_for(options, &sleep_fn, || {
        let next = script
            .lock()
            .unwrap()
            .pop_front()
            .expect("probe called more often than scripted");
        async move { next }
    })
    .await
}

fn backoff(n: u32) -> Duration {
    calc_exp_backoff(&PollerOptions::default(), n)
}

#[tokio::test]
async fn test_transient_failures_back_off_exponentially() {
    let options = PollerOptions::default();
    let sleeper = SleepRecorder::default();
    let steps = script(vec![
        Err(network_error()),
        Err(network_error()),
        Err(network_error()),
        Ok(Some(42)),
    ]);

    assert_eq!(run(&options, &sleeper, &steps).await.unwrap(), 42);

    let delays = sleeper.delays();
    assert_eq!(delays, vec![backoff(1), backoff(2), backoff(3)]);
    assert_eq!(delays[0], Duration::from_millis(1875));
    assert!(delays.windows(2).all(|pair| pair[0] < pair[1]));
}

#[tokio::test]
async fn test_sixth_consecutive_failure_is_fatal() {
    let options = PollerOptions::default();
    let sleeper = SleepRecorder::default();
    let steps = script((0..6).map(|_| Err(network_error())).collect());

    let err = run(&options, &sleeper, &steps).await.unwrap_err();
    assert!(matches!(err, CliError::RetriesExhausted(5)));
    assert_eq!(err.to_string(), "Failed 5 times!");

    // five retries, no sixth
    assert_eq!(sleeper.delays().len(), 5);
    assert!(steps.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_successful_call_resets_fail_count() {
    let options = PollerOptions::default();
    let sleeper = SleepRecorder::default();
    let steps = script(vec![
        Err(network_error()),
        Err(network_error()),
        Ok(None),
        Err(network_error()),
        Ok(Some(7)),
    ]);

    assert_eq!(run(&options, &sleeper, &steps).await.unwrap(), 7);
    assert_eq!(
        sleeper.delays(),
        vec![backoff(1), backoff(2), Duration::from_millis(5000), backoff(1)]
    );
}

#[tokio::test]
async fn test_not_ready_polls_at_fixed_pace() {
    let options = PollerOptions::default();
    let sleeper = SleepRecorder::default();
    let steps = script(vec![Ok(None), Ok(None), Ok(None), Ok(Some(1))]);

    assert_eq!(run(&options, &sleeper, &steps).await.unwrap(), 1);
    assert_eq!(sleeper.delays(), vec![Duration::from_millis(5000); 3]);
}

#[tokio::test]
async fn test_api_errors_are_not_retried() {
    let options = PollerOptions::default();
    let sleeper = SleepRecorder::default();
    let steps = script(vec![
        Err(CliError::ApiError {
            status: 401,
            message: "Unauthorized".to_string(),
        }),
        Ok(Some(1)),
    ]);

    let err = run(&options, &sleeper, &steps).await.unwrap_err();
    assert!(matches!(err, CliError::ApiError { status: 401, .. }));
    assert!(sleeper.delays().is_empty());
    assert_eq!(steps.lock().unwrap().len(), 1);
}

#[tokio::test]
async fn test_retry_budget_follows_options() {
    let options = PollerOptions {
        max_retry_count: 2,
        ..PollerOptions::default()
    };
    let sleeper = SleepRecorder::default();
    let steps = script((0..3).map(|_| Err(network_error())).collect());

    let err = run(&options, &sleeper, &steps).await.unwrap_err();
    assert_eq!(err.to_string(), "Failed 2 times!");
    assert_eq!(sleeper.delays().len(), 2);
}
