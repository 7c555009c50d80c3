//! Live channels of the platform: log streams over SSE, events over WebSocket

pub mod sse;
pub mod ws;

use std::sync::Arc;
use std::time::Duration;

use reqwest::Client;
use secrecy::SecretString;
use url::Url;

use crate::errors::CliError;
use crate::http::logs::LogQuery;
use crate::watch::relay::StreamConnector;
use crate::watch::{AppTarget, LogStreams};
use sse::SseConnector;
use ws::WsConnector;

/// Builds the live channels of the platform API
pub struct StreamFactory {
    client: Client,
    api_host: Url,
    token: SecretString,
}

impl StreamFactory {
    pub fn new(api_host: &str, token: SecretString) -> Result<Self, CliError> {
        // No overall timeout, streams stay open for as long as they are relayed
        let client = Client::builder()
            .connect_timeout(Duration::from_secs(10))
            .user_agent(concat!("clever-cli/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            client,
            api_host: Url::parse(api_host)?,
            token,
        })
    }

    fn logs_url(&self, app_or_addon_id: &str) -> Url {
        let mut url = self.api_host.clone();
        url.set_path(&format!("/v2/logs/logs-sse/{}", app_or_addon_id));
        url.set_query(None);
        url
    }

    /// Live logs of an application or add-on
    pub fn app_logs(&self, app_or_addon_id: &str, query: &LogQuery) -> Arc<dyn StreamConnector> {
        let mut url = self.logs_url(app_or_addon_id);
        {
            let mut pairs = url.query_pairs_mut();
            if let Some(since) = query.since {
                pairs.append_pair("since", &since.to_rfc3339());
            }
            if let Some(filter) = &query.filter {
                pairs.append_pair("filter", filter);
            }
            if let Some(deployment_id) = &query.deployment_id {
                pairs.append_pair("deployment_id", deployment_id);
            }
        }
        if url.query() == Some("") {
            url.set_query(None);
        }

        Arc::new(SseConnector::new("logs", self.client.clone(), url, self.token.clone()))
    }

    /// Live events of an application
    pub fn app_events(&self, app_id: &str) -> Result<Arc<dyn StreamConnector>, CliError> {
        let mut url = self.api_host.clone();
        let scheme = match url.scheme() {
            "http" => "ws",
            _ => "wss",
        };
        url.set_scheme(scheme)
            .map_err(|_| CliError::ConfigError(format!("Cannot open a WebSocket on {}", self.api_host)))?;
        url.set_path("/v2/events/event-socket");
        url.set_query(None);
        url.query_pairs_mut().append_pair("appId", app_id);

        Ok(Arc::new(WsConnector::new("events", url, self.token.clone())))
    }
}

impl LogStreams for StreamFactory {
    fn deployment_logs(&self, app: &AppTarget, deployment_id: &str) -> Arc<dyn StreamConnector> {
        let query = LogQuery {
            deployment_id: Some(deployment_id.to_string()),
            ..LogQuery::default()
        };
        self.app_logs(&app.app_id, &query)
    }
}
