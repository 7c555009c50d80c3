//! Live relay of a push channel (logs or events) with automatic reconnection
//!
//! Delivery is at-most-once: messages emitted while the channel is being
//! reopened are lost. The relay only stops when the consumer closes it or
//! when the channel cannot be reopened anymore. A connection that drops
//! before delivering anything does not refill the retry budget.

use std::sync::Arc;
use std::time::Duration;

use api_client::models::{LogLine, PlatformEvent};
use async_trait::async_trait;
use futures::stream::BoxStream;
use futures::StreamExt;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::errors::CliError;

/// Message received on a live channel
#[derive(Debug, Clone)]
pub enum StreamEnvelope {
    /// The channel is open, emitted once even if it is reopened later
    Open,
    Log(LogLine),
    Event(PlatformEvent),
    Ping,
    /// The consumer closed the relay, always the last envelope
    Close { reason: String },
}

pub type EnvelopeStream = BoxStream<'static, Result<StreamEnvelope, CliError>>;

/// Opens one connection of a live channel.
///
/// The returned stream ending means the transport was disconnected.
#[async_trait]
pub trait StreamConnector: Send + Sync {
    /// Short name used in diagnostics and errors
    fn name(&self) -> &str;

    async fn connect(&self) -> Result<EnvelopeStream, CliError>;
}

/// Relay options
#[derive(Debug, Clone)]
pub struct RelayOptions {
    /// Reopen the channel after a transport failure
    pub auto_retry: bool,

    /// Consecutive reopen attempts before giving up
    pub max_retry_count: u32,

    /// Delay before reopening the channel
    pub reconnect_delay: Duration,
}

impl Default for RelayOptions {
    fn default() -> Self {
        Self {
            auto_retry: true,
            max_retry_count: 6,
            reconnect_delay: Duration::from_secs(1),
        }
    }
}

/// How a relay stopped
#[derive(Debug)]
pub enum RelayOutcome {
    Closed(String),
    Failed(CliError),
}

/// Closes a relay. Closing twice is a no-op.
#[derive(Debug, Clone)]
pub struct RelayCloser {
    tx: Arc<watch::Sender<Option<String>>>,
}

impl RelayCloser {
    pub fn close(&self, reason: &str) {
        self.tx.send_if_modified(|current| {
            if current.is_some() {
                return false;
            }
            *current = Some(reason.to_string());
            true
        });
    }

    pub fn is_closed(&self) -> bool {
        self.tx.borrow().is_some()
    }
}

/// A running relay
pub struct LiveRelay {
    closer: RelayCloser,
    task: JoinHandle<RelayOutcome>,
}

impl LiveRelay {
    /// Open the channel in a background task and feed every envelope to `handler`
    pub fn open<H>(connector: Arc<dyn StreamConnector>, options: RelayOptions, handler: H) -> Self
    where
        H: FnMut(StreamEnvelope, &RelayCloser) + Send + 'static,
    {
        let (tx, rx) = watch::channel(None);
        let closer = RelayCloser { tx: Arc::new(tx) };
        let task = tokio::spawn(run(connector, options, handler, closer.clone(), rx));

        Self { closer, task }
    }

    pub fn closer(&self) -> RelayCloser {
        self.closer.clone()
    }

    pub fn close(&self, reason: &str) {
        self.closer.close(reason);
    }

    /// Resolves once the relay has stopped, either closed or failed
    pub async fn join(self) -> RelayOutcome {
        match self.task.await {
            Ok(outcome) => outcome,
            Err(e) => RelayOutcome::Failed(CliError::Internal(format!("Relay task failed: {}", e))),
        }
    }
}

async fn run<H>(
    connector: Arc<dyn StreamConnector>,
    options: RelayOptions,
    mut handler: H,
    closer: RelayCloser,
    mut close_rx: watch::Receiver<Option<String>>,
) -> RelayOutcome
where
    H: FnMut(StreamEnvelope, &RelayCloser) + Send,
{
    let stream_name = connector.name().to_string();
    let mut retry_count: u32 = 0;
    let mut opened = false;

    loop {
        let connection = tokio::select! {
            biased;
            reason = closed(&mut close_rx) => {
                return finish(&mut handler, &closer, opened, reason);
            }
            connection = connector.connect() => connection,
        };

        let failure = match connection {
            Ok(mut stream) => {
                debug!("{} stream (open)", stream_name);
                if !opened {
                    opened = true;
                    handler(StreamEnvelope::Open, &closer);
                }

                loop {
                    tokio::select! {
                        biased;
                        reason = closed(&mut close_rx) => {
                            return finish(&mut handler, &closer, opened, reason);
                        }
                        item = stream.next() => {
                            // A connection only counts as healthy once it delivers something
                            if matches!(item, Some(Ok(_))) {
                                retry_count = 0;
                            }
                            match item {
                                Some(Ok(StreamEnvelope::Ping)) => {
                                    debug!("{} stream (ping)", stream_name);
                                    handler(StreamEnvelope::Ping, &closer);
                                }
                                Some(Ok(envelope)) => handler(envelope, &closer),
                                Some(Err(e)) => break e,
                                None => break CliError::StreamDisconnected { stream: stream_name.clone() },
                            }
                        }
                    }
                }
            }
            Err(e) => e,
        };

        if !options.auto_retry || !failure.is_reconnectable() {
            warn!("{} stream failed: {}", stream_name, failure);
            return RelayOutcome::Failed(failure);
        }

        retry_count += 1;
        if retry_count > options.max_retry_count {
            warn!("{} stream failed: {}", stream_name, failure);
            return RelayOutcome::Failed(CliError::StreamExhausted {
                stream: stream_name,
                attempts: options.max_retry_count,
            });
        }

        info!(
            "{} stream interrupted ({}), reconnecting {}/{}",
            stream_name, failure, retry_count, options.max_retry_count
        );

        tokio::select! {
            biased;
            reason = closed(&mut close_rx) => {
                return finish(&mut handler, &closer, opened, reason);
            }
            _ = tokio::time::sleep(options.reconnect_delay) => {}
        }
    }
}

fn finish<H>(handler: &mut H, closer: &RelayCloser, opened: bool, reason: String) -> RelayOutcome
where
    H: FnMut(StreamEnvelope, &RelayCloser),
{
    if opened {
        handler(StreamEnvelope::Close { reason: reason.clone() }, closer);
    }
    RelayOutcome::Closed(reason)
}

/// Resolves with the close reason once the relay is closed
async fn closed(close_rx: &mut watch::Receiver<Option<String>>) -> String {
    loop {
        let current = close_rx.borrow_and_update().clone();
        if let Some(reason) = current {
            return reason;
        }
        if close_rx.changed().await.is_err() {
            return std::future::pending().await;
        }
    }
}
