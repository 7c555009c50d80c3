//! Log history API client

use api_client::models::LogLine;
use chrono::{DateTime, Utc};

use crate::errors::CliError;
use crate::http::client::HttpClient;

/// Bounds and filters of a log query
#[derive(Debug, Clone, Default)]
pub struct LogQuery {
    pub since: Option<DateTime<Utc>>,
    pub until: Option<DateTime<Utc>>,
    pub filter: Option<String>,
    pub deployment_id: Option<String>,
}

impl HttpClient {
    /// Get past log lines of an application or add-on, most recent first
    pub async fn get_old_logs(
        &self,
        app_or_addon_id: &str,
        query: &LogQuery,
    ) -> Result<Vec<LogLine>, CliError> {
        let mut url = self.endpoint(&format!("/v2/logs/{}", app_or_addon_id))?;
        {
            let mut pairs = url.query_pairs_mut();
            if let Some(until) = query.until {
                pairs.append_pair("before", &until.to_rfc3339());
            }
            if let Some(since) = query.since {
                pairs.append_pair("after", &since.to_rfc3339());
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
        self.get(url).await
    }
}
