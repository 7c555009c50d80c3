//! Application API client

use api_client::models::Application;

use crate::errors::CliError;
use crate::http::client::{owner_path, HttpClient};
use crate::watch::AppTarget;

impl HttpClient {
    /// Get an application, including its currently deployed commit
    pub async fn get_application(&self, app: &AppTarget) -> Result<Application, CliError> {
        let url = self.endpoint(&format!(
            "{}/applications/{}",
            owner_path(&app.owner_id),
            app.app_id
        ))?;
        self.get(url).await
    }
}
