//! Server-sent events transport for live logs

use std::collections::VecDeque;

use api_client::models::LogLine;
use async_trait::async_trait;
use futures::StreamExt;
use reqwest::{header, Client};
use secrecy::{ExposeSecret, SecretString};
use tracing::{debug, warn};
use url::Url;

use crate::errors::CliError;
use crate::http::client::api_error;
use crate::watch::relay::{EnvelopeStream, StreamConnector, StreamEnvelope};

/// One dispatched server-sent event
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SseEvent {
    pub event: Option<String>,
    pub data: String,
}

/// Incremental decoder of a `text/event-stream` body
#[derive(Debug, Default)]
pub struct SseDecoder {
    buffer: Vec<u8>,
}

impl SseDecoder {
    /// Feed a body chunk and return the events it completes
    pub fn push(&mut self, chunk: &[u8]) -> Vec<SseEvent> {
        self.buffer.extend(chunk.iter().filter(|b| **b != b'\r'));

        let mut events = Vec::new();
        while let Some(end) = self.buffer.windows(2).position(|w| w == b"\n\n") {
            let block: Vec<u8> = self.buffer.drain(..end + 2).collect();
            if let Some(event) = parse_block(&String::from_utf8_lossy(&block)) {
                events.push(event);
            }
        }
        events
    }
}

fn parse_block(block: &str) -> Option<SseEvent> {
    let mut event = None;
    let mut data: Option<String> = None;

    for line in block.lines() {
        if line.is_empty() || line.starts_with(':') {
            continue;
        }
        let (field, value) = line.split_once(':').unwrap_or((line, ""));
        let value = value.strip_prefix(' ').unwrap_or(value);
        match field {
            "event" => event = Some(value.to_string()),
            "data" => match data.as_mut() {
                Some(data) => {
                    data.push('\n');
                    data.push_str(value);
                }
                None => data = Some(value.to_string()),
            },
            _ => {}
        }
    }

    if event.is_none() && data.is_none() {
        return None;
    }
    Some(SseEvent {
        event,
        data: data.unwrap_or_default(),
    })
}

fn to_envelope(event: SseEvent) -> Option<StreamEnvelope> {
    match event.event.as_deref() {
        None | Some("APPLICATION_LOG") | Some("message") => {
            match serde_json::from_str::<LogLine>(&event.data) {
                Ok(line) => Some(StreamEnvelope::Log(line)),
                Err(e) => {
                    warn!("Skipping malformed log line: {}", e);
                    None
                }
            }
        }
        Some("PING") | Some("ping") | Some("heartbeat") => Some(StreamEnvelope::Ping),
        Some(other) => {
            debug!("Ignoring server-sent event {}", other);
            None
        }
    }
}

/// Opens a server-sent events channel
pub struct SseConnector {
    name: String,
    client: Client,
    url: Url,
    token: SecretString,
}

impl SseConnector {
    pub fn new(name: impl Into<String>, client: Client, url: Url, token: SecretString) -> Self {
        Self {
            name: name.into(),
            client,
            url,
            token,
        }
    }

    pub fn url(&self) -> &Url {
        &self.url
    }
}

#[async_trait]
impl StreamConnector for SseConnector {
    fn name(&self) -> &str {
        &self.name
    }

    async fn connect(&self) -> Result<EnvelopeStream, CliError> {
        debug!("Opening {} stream: {}", self.name, self.url);
        let response = self
            .client
            .get(self.url.clone())
            .header(header::ACCEPT, "text/event-stream")
            .header(
                header::AUTHORIZATION,
                format!("Bearer {}", self.token.expose_secret()),
            )
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(api_error(status, &body));
        }

        let state = (response.bytes_stream().boxed(), SseDecoder::default(), VecDeque::new());
        let envelopes = futures::stream::unfold(state, |(mut body, mut decoder, mut pending)| async move {
            loop {
                if let Some(envelope) = pending.pop_front() {
                    return Some((Ok(envelope), (body, decoder, pending)));
                }
                match body.next().await {
                    Some(Ok(chunk)) => pending.extend(decoder.push(&chunk).into_iter().filter_map(to_envelope)),
                    Some(Err(e)) => return Some((Err(CliError::from(e)), (body, decoder, pending))),
                    None => return None,
                }
            }
        });

        Ok(envelopes.boxed())
    }
}
