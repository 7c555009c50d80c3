//! Local git repository operations, driven through the `git` executable
//!
//! Authentication against the deploy remote is left to the user's git
//! credential helper.

use std::path::{Path, PathBuf};
use std::process::Output;

use async_trait::async_trait;
use tokio::process::Command;
use tracing::{debug, info};

use crate::errors::CliError;
use crate::filesys::find_in_ancestors;

/// Branch of the deploy remote that triggers deployments
pub const REMOTE_DEPLOY_BRANCH: &str = "refs/heads/master";

/// Destination the source code is pushed to
#[async_trait]
pub trait SourceRemote: Send + Sync {
    /// Push `refspec` to the deploy branch of `remote_url`
    async fn push(&self, remote_url: &str, refspec: &str, force: bool) -> Result<(), CliError>;

    /// Whether the local history is truncated
    async fn is_shallow(&self) -> bool;
}

/// A git working copy
#[derive(Debug, Clone)]
pub struct GitRepo {
    dir: PathBuf,
}

impl GitRepo {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Find the repository containing `start`
    pub fn discover(start: &Path) -> Result<Self, CliError> {
        find_in_ancestors(start, ".git")
            .map(Self::new)
            .ok_or_else(|| CliError::GitError("Could not find the .git folder.".to_string()))
    }

    /// Root directory of the working copy
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Expand a branch name to its full ref. The current branch (or `HEAD` when
    /// detached) is used when no branch is given.
    pub async fn full_branch(&self, branch: Option<&str>) -> Result<String, CliError> {
        match branch.filter(|b| !b.is_empty()) {
            None => {
                let output = self.git(&["symbolic-ref", "-q", "HEAD"]).await?;
                let current = stdout_line(&output);
                Ok(if current.is_empty() { "HEAD".to_string() } else { current })
            }
            Some(branch) => {
                let output = self
                    .git_checked(&["rev-parse", "--symbolic-full-name", branch])
                    .await?;
                let full = stdout_line(&output);
                if full.is_empty() {
                    return Err(CliError::GitError(format!("Could not find branch {}", branch)));
                }
                Ok(full)
            }
        }
    }

    /// Commit a ref points to
    pub async fn branch_commit(&self, refspec: &str) -> Result<String, CliError> {
        let target = format!("{}^{{commit}}", refspec);
        let output = self.git_checked(&["rev-parse", "--verify", &target]).await?;
        Ok(stdout_line(&output))
    }

    /// Expand a possibly abbreviated commit id
    pub async fn resolve_full_commit(&self, commit_id: &str) -> Result<String, CliError> {
        let target = format!("{}^{{commit}}", commit_id);
        let output = self.git(&["rev-parse", "--verify", "--quiet", &target]).await?;

        let full = stdout_line(&output);
        if !output.status.success() || full.is_empty() {
            return Err(CliError::GitError(format!("Commit id {} is ambiguous", commit_id)));
        }
        Ok(full)
    }

    /// Commit the deploy branch of a remote points to, `None` for an empty remote
    pub async fn remote_head_commit(&self, remote_url: &str) -> Result<Option<String>, CliError> {
        let output = self
            .git_checked(&["ls-remote", remote_url, REMOTE_DEPLOY_BRANCH])
            .await?;

        Ok(String::from_utf8_lossy(&output.stdout)
            .lines()
            .filter_map(|line| line.split_whitespace().next())
            .next()
            .map(str::to_string))
    }

    /// Register the deploy remote under a slug of `name`, unless it already exists
    pub async fn add_remote(&self, name: &str, url: &str) -> Result<(), CliError> {
        let remote_name = slugify(name);
        let output = self.git_checked(&["remote"]).await?;
        let exists = String::from_utf8_lossy(&output.stdout)
            .lines()
            .any(|line| line.trim() == remote_name);

        if !exists {
            debug!("Adding git remote {} -> {}", remote_name, url);
            self.git_checked(&["remote", "add", &remote_name, url]).await?;
        }
        Ok(())
    }

    async fn git(&self, args: &[&str]) -> Result<Output, CliError> {
        debug!("git {}", args.join(" "));
        Command::new("git")
            .current_dir(&self.dir)
            .args(args)
            .output()
            .await
            .map_err(|e| CliError::GitError(format!("Failed to run git: {}", e)))
    }

    async fn git_checked(&self, args: &[&str]) -> Result<Output, CliError> {
        let output = self.git(args).await?;
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(CliError::GitError(format!(
                "git {} failed: {}",
                args.first().copied().unwrap_or_default(),
                stderr.trim()
            )));
        }
        Ok(output)
    }
}

#[async_trait]
impl SourceRemote for GitRepo {
    async fn push(&self, remote_url: &str, refspec: &str, force: bool) -> Result<(), CliError> {
        let destination = format!("{}:{}", refspec, REMOTE_DEPLOY_BRANCH);
        let mut args = vec!["push"];
        if force {
            args.push("--force");
        }
        args.push(remote_url);
        args.push(&destination);

        let output = self.git(&args).await?;
        if output.status.success() {
            info!("Pushed {} to {}", refspec, remote_url);
            return Ok(());
        }

        let stderr = String::from_utf8_lossy(&output.stderr);
        Err(push_error(&stderr))
    }

    async fn is_shallow(&self) -> bool {
        tokio::fs::try_exists(self.dir.join(".git").join("shallow"))
            .await
            .unwrap_or(false)
    }
}

fn push_error(stderr: &str) -> CliError {
    if stderr.contains("non-fast-forward") || stderr.contains("[rejected]") {
        CliError::PushRejected
    } else {
        CliError::GitError(format!("git push failed: {}", stderr.trim()))
    }
}

fn stdout_line(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).trim().to_string()
}

/// Make an application name usable as a git remote name
pub fn slugify(name: &str) -> String {
    let mut slug = String::with_capacity(name.len());
    for c in name.trim().chars() {
        if c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.') {
            slug.push(c);
        } else if c.is_whitespace() && !slug.ends_with('-') {
            slug.push('-');
        }
    }
    slug
}
