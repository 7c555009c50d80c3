//! Live relay tests

use std::sync::{Arc, Mutex};
use std::time::Duration;

use clever_cli::errors::CliError;
use clever_cli::watch::relay::{LiveRelay, RelayCloser, RelayOptions, RelayOutcome, StreamEnvelope};

use crate::fakes::{log_line, network_error, Connection, ScriptedConnector};

fn fast_options() -> RelayOptions {
    RelayOptions {
        reconnect_delay: Duration::from_millis(1),
        ..RelayOptions::default()
    }
}

type Seen = Arc<Mutex<Vec<String>>>;

fn describe(envelope: &StreamEnvelope) -> String {
    match envelope {
        StreamEnvelope::Open => "open".to_string(),
        StreamEnvelope::Log(line) => format!("log:{}", line.message()),
        StreamEnvelope::Event(event) => format!("event:{}", event.event),
        StreamEnvelope::Ping => "ping".to_string(),
        StreamEnvelope::Close { reason } => format!("close:{}", reason),
    }
}

fn recorder() -> (Seen, impl FnMut(StreamEnvelope, &RelayCloser) + Send + 'static) {
    let seen: Seen = Arc::new(Mutex::new(Vec::new()));
    let sink = seen.clone();
    let handler = move |envelope: StreamEnvelope, _: &RelayCloser| {
        sink.lock().unwrap().push(describe(&envelope));
    };
    (seen, handler)
}

async fn wait_until(seen: &Seen, count: usize) {
    tokio::time::timeout(Duration::from_secs(5), async {
        while seen.lock().unwrap().len() < count {
            tokio::time::sleep(Duration::from_millis(1)).await;
        }
    })
    .await
    .expect("relay did not deliver in time");
}

#[tokio::test]
async fn test_relay_reconnects_after_disconnect() {
    let connector = ScriptedConnector::new(vec![
        Connection::Drops(vec![Ok(StreamEnvelope::Log(log_line("first")))]),
        Connection::Refused(network_error()),
        Connection::Idles(vec![
            Ok(StreamEnvelope::Ping),
            Ok(StreamEnvelope::Log(log_line("second"))),
        ]),
    ]);
    let (seen, handler) = recorder();

    let relay = LiveRelay::open(connector.clone(), fast_options(), handler);
    wait_until(&seen, 4).await;

    relay.close("done");
    assert!(matches!(relay.join().await, RelayOutcome::Closed(reason) if reason == "done"));

    // open is reported once, even across reconnections
    assert_eq!(
        *seen.lock().unwrap(),
        vec!["open", "log:first", "ping", "log:second", "close:done"]
    );
    assert_eq!(connector.connect_count(), 3);
}

#[tokio::test]
async fn test_relay_gives_up_after_retry_budget() {
    let connector = ScriptedConnector::refusing(network_error);
    let (seen, handler) = recorder();

    let outcome = LiveRelay::open(connector.clone(), fast_options(), handler).join().await;

    match outcome {
        RelayOutcome::Failed(CliError::StreamExhausted { stream, attempts }) => {
            assert_eq!(stream, "logs");
            assert_eq!(attempts, 6);
        }
        other => panic!("unexpected outcome: {:?}", other),
    }
    assert_eq!(connector.connect_count(), 7);
    assert!(seen.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_relay_does_not_retry_auth_failures() {
    let connector = ScriptedConnector::refusing(|| CliError::ApiError {
        status: 401,
        message: "Unauthorized".to_string(),
    });
    let (_, handler) = recorder();

    let outcome = LiveRelay::open(connector.clone(), fast_options(), handler).join().await;

    assert!(matches!(
        outcome,
        RelayOutcome::Failed(CliError::ApiError { status: 401, .. })
    ));
    assert_eq!(connector.connect_count(), 1);
}

#[tokio::test]
async fn test_relay_without_auto_retry_fails_on_first_disconnect() {
    let connector = ScriptedConnector::new(vec![Connection::Drops(vec![])]);
    let (_, handler) = recorder();
    let options = RelayOptions {
        auto_retry: false,
        ..fast_options()
    };

    let outcome = LiveRelay::open(connector.clone(), options, handler).join().await;

    assert!(matches!(
        outcome,
        RelayOutcome::Failed(CliError::StreamDisconnected { .. })
    ));
    assert_eq!(connector.connect_count(), 1);
}

#[tokio::test]
async fn test_close_is_idempotent_and_drops_the_connection() {
    let connector = ScriptedConnector::idle();
    let (seen, handler) = recorder();

    let relay = LiveRelay::open(connector.clone(), fast_options(), handler);
    wait_until(&seen, 1).await;

    let closer = relay.closer();
    closer.close("first");
    closer.close("second");
    assert!(closer.is_closed());

    assert!(matches!(relay.join().await, RelayOutcome::Closed(reason) if reason == "first"));
    assert_eq!(*seen.lock().unwrap(), vec!["open", "close:first"]);
    assert!(connector.was_dropped());
}

#[tokio::test]
async fn test_handler_can_close_the_relay() {
    let connector = ScriptedConnector::new(vec![Connection::Idles(vec![
        Ok(StreamEnvelope::Log(log_line("one"))),
        Ok(StreamEnvelope::Log(log_line("two"))),
        Ok(StreamEnvelope::Log(log_line("three"))),
    ])]);
    let seen: Seen = Arc::new(Mutex::new(Vec::new()));
    let sink = seen.clone();

    let relay = LiveRelay::open(connector, fast_options(), move |envelope, closer| {
        if let StreamEnvelope::Log(line) = &envelope {
            if line.message() == "two" {
                closer.close("end date reached");
                return;
            }
        }
        sink.lock().unwrap().push(describe(&envelope));
    });

    assert!(matches!(relay.join().await, RelayOutcome::Closed(_)));
    assert_eq!(
        *seen.lock().unwrap(),
        vec!["open", "log:one", "close:end date reached"]
    );
}

#[tokio::test]
async fn test_closing_before_open_emits_nothing() {
    let connector = ScriptedConnector::refusing(network_error);
    let (seen, handler) = recorder();
    let options = RelayOptions {
        reconnect_delay: Duration::from_secs(60),
        ..RelayOptions::default()
    };

    let relay = LiveRelay::open(connector, options, handler);
    relay.close("not needed");

    assert!(matches!(relay.join().await, RelayOutcome::Closed(_)));
    assert!(seen.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_idle_relay_runs_until_closed() {
    let connector = ScriptedConnector::idle();
    let (seen, handler) = recorder();

    let relay = LiveRelay::open(connector, fast_options(), handler);
    let closer = relay.closer();
    let mut joined = tokio_test::task::spawn(relay.join());

    wait_until(&seen, 1).await;
    tokio_test::assert_pending!(joined.poll());

    closer.close("bye");
    assert!(matches!(joined.await, RelayOutcome::Closed(reason) if reason == "bye"));
}

#[tokio::test]
async fn test_connections_dropped_before_delivering_exhaust_the_budget() {
    let connector = ScriptedConnector::new((0..7).map(|_| Connection::Drops(vec![])).collect());
    let (seen, handler) = recorder();

    let outcome = tokio::time::timeout(
        Duration::from_secs(5),
        LiveRelay::open(connector.clone(), fast_options(), handler).join(),
    )
    .await
    .expect("relay kept reconnecting");

    assert!(matches!(
        outcome,
        RelayOutcome::Failed(CliError::StreamExhausted { attempts: 6, .. })
    ));
    assert_eq!(connector.connect_count(), 7);
    assert_eq!(*seen.lock().unwrap(), vec!["open"]);
}

#[tokio::test]
async fn test_delivering_connection_refills_the_budget() {
    let mut connections: Vec<_> = (0..6).map(|_| Connection::Drops(vec![])).collect();
    connections.push(Connection::Drops(vec![Ok(StreamEnvelope::Ping)]));
    connections.extend((0..5).map(|_| Connection::Drops(vec![])));
    connections.push(Connection::Idles(vec![Ok(StreamEnvelope::Log(log_line("back")))]));
    let connector = ScriptedConnector::new(connections);
    let (seen, handler) = recorder();

    let relay = LiveRelay::open(connector.clone(), fast_options(), handler);
    wait_until(&seen, 3).await;
    assert_eq!(*seen.lock().unwrap(), vec!["open", "ping", "log:back"]);
    assert_eq!(connector.connect_count(), 13);

    relay.close("done");
    assert!(matches!(relay.join().await, RelayOutcome::Closed(_)));
}
