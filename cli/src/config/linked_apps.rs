//! Applications linked to the local repository

use serde::{Deserialize, Serialize};

use crate::errors::CliError;

/// Content of the linked applications file
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LinkedApps {
    #[serde(default)]
    pub apps: Vec<LinkedApp>,
}

/// One application linked to the repository
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinkedApp {
    pub app_id: String,
    pub org_id: String,
    pub deploy_url: String,
    pub name: String,
    pub alias: String,
}

impl LinkedApps {
    /// Pick the application targeted by a command
    pub fn resolve(&self, alias: Option<&str>) -> Result<&LinkedApp, CliError> {
        match alias {
            Some(alias) => self.apps.iter().find(|app| app.alias == alias).ok_or_else(|| {
                CliError::NotLinked(format!(
                    "There is no linked application with alias \"{}\" in this directory",
                    alias
                ))
            }),
            None => match self.apps.as_slice() {
                [] => Err(CliError::NotLinked(
                    "There is no linked application in this directory".to_string(),
                )),
                [app] => Ok(app),
                _ => Err(CliError::NotLinked(
                    "Several applications are linked. You can specify one with the \"--alias\" option. Run \"clever applications\" to list linked applications."
                        .to_string(),
                )),
            },
        }
    }
}
