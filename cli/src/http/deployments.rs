//! Deployment API client

use api_client::models::{Deployment, RedeployResponse};
use async_trait::async_trait;

use crate::errors::CliError;
use crate::http::client::{owner_path, HttpClient};
use crate::watch::{AppTarget, DeploymentApi};

fn app_path(app: &AppTarget) -> String {
    format!("{}/applications/{}", owner_path(&app.owner_id), app.app_id)
}

#[async_trait]
impl DeploymentApi for HttpClient {
    async fn list_deployments(
        &self,
        app: &AppTarget,
        limit: Option<u32>,
    ) -> Result<Vec<Deployment>, CliError> {
        let mut url = self.endpoint(&format!("{}/deployments", app_path(app)))?;
        if let Some(limit) = limit {
            url.query_pairs_mut().append_pair("limit", &limit.to_string());
        }
        self.get(url).await
    }

    async fn get_deployment(
        &self,
        app: &AppTarget,
        deployment_id: &str,
    ) -> Result<Deployment, CliError> {
        let url = self.endpoint(&format!("{}/deployments/{}", app_path(app), deployment_id))?;
        self.get(url).await
    }

    async fn redeploy(
        &self,
        app: &AppTarget,
        commit_id: Option<&str>,
        use_cache: bool,
    ) -> Result<RedeployResponse, CliError> {
        let mut url = self.endpoint(&format!("{}/instances", app_path(app)))?;
        {
            let mut query = url.query_pairs_mut();
            if let Some(commit_id) = commit_id {
                query.append_pair("commit", commit_id);
            }
            if !use_cache {
                query.append_pair("useCache", "no");
            }
        }
        // Url keeps a dangling '?' when no pair was appended
        if url.query() == Some("") {
            url.set_query(None);
        }
        self.post(url, &serde_json::json!({})).await
    }
}
