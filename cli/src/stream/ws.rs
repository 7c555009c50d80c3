//! WebSocket transport for live platform events

use api_client::models::PlatformEvent;
use async_trait::async_trait;
use futures::StreamExt;
use http::header::AUTHORIZATION;
use http::HeaderValue;
use secrecy::{ExposeSecret, SecretString};
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::client::IntoClientRequest;
use tokio_tungstenite::tungstenite::protocol::Message;
use tokio_tungstenite::tungstenite::Error as WsError;
use tracing::debug;
use url::Url;

use crate::errors::CliError;
use crate::watch::relay::{EnvelopeStream, StreamConnector, StreamEnvelope};

/// Opens a WebSocket channel of platform events
pub struct WsConnector {
    name: String,
    url: Url,
    token: SecretString,
}

impl WsConnector {
    pub fn new(name: impl Into<String>, url: Url, token: SecretString) -> Self {
        Self {
            name: name.into(),
            url,
            token,
        }
    }

    pub fn url(&self) -> &Url {
        &self.url
    }

    fn map_error(&self, err: WsError) -> CliError {
        ws_error(&self.name, err)
    }
}

#[async_trait]
impl StreamConnector for WsConnector {
    fn name(&self) -> &str {
        &self.name
    }

    async fn connect(&self) -> Result<EnvelopeStream, CliError> {
        debug!("Opening {} stream: {}", self.name, self.url);
        let mut request = self
            .url
            .as_str()
            .into_client_request()
            .map_err(|e| self.map_error(e))?;

        let authorization = HeaderValue::from_str(&format!("Bearer {}", self.token.expose_secret()))
            .map_err(|e| CliError::ConfigError(format!("Invalid token: {}", e)))?;
        request.headers_mut().insert(AUTHORIZATION, authorization);

        let (socket, _) = connect_async(request).await.map_err(|e| self.map_error(e))?;

        let name = self.name.clone();
        let envelopes = socket.filter_map(move |message| {
            let name = name.clone();
            async move {
                match message {
                    Ok(Message::Text(text)) => parse_event(text.as_str()).map(Ok),
                    Ok(Message::Ping(_)) => Some(Ok(StreamEnvelope::Ping)),
                    Ok(Message::Close(frame)) => {
                        debug!("{} stream closed by the server: {:?}", name, frame);
                        Some(Err(CliError::StreamDisconnected { stream: name }))
                    }
                    Ok(_) => None,
                    Err(e) => Some(Err(ws_error(&name, e))),
                }
            }
        });

        Ok(envelopes.boxed())
    }
}

/// Decode a text frame into an envelope, `None` for frames of no interest
pub fn parse_event(text: &str) -> Option<StreamEnvelope> {
    let value: serde_json::Value = match serde_json::from_str(text) {
        Ok(value) => value,
        Err(e) => {
            debug!("Ignoring non JSON frame: {}", e);
            return None;
        }
    };

    if value.get("type").and_then(|t| t.as_str()) == Some("ping") {
        return Some(StreamEnvelope::Ping);
    }
    if value.get("event").is_none() {
        return None;
    }

    match serde_json::from_value::<PlatformEvent>(value) {
        Ok(event) => Some(StreamEnvelope::Event(event)),
        Err(e) => {
            debug!("Ignoring malformed event: {}", e);
            None
        }
    }
}

fn ws_error(stream: &str, err: WsError) -> CliError {
    match err {
        WsError::Http(response) => {
            let status = response.status().as_u16();
            let message = response
                .body()
                .as_ref()
                .map(|body| String::from_utf8_lossy(body).to_string())
                .unwrap_or_else(|| status.to_string());
            CliError::ApiError { status, message }
        }
        WsError::Io(e) => CliError::NetworkError(e.to_string()),
        WsError::ConnectionClosed | WsError::AlreadyClosed => CliError::StreamDisconnected {
            stream: stream.to_string(),
        },
        other => CliError::WebSocketError(other.to_string()),
    }
}
