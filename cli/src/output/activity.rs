//! Deployment activity rendering
//!
//! Rendering is a fold over the ordered activity entries: each step takes
//! the previously rendered entry and returns the next one along with what to
//! print.

use api_client::models::{Deployment, PlatformEvent};
use chrono::{DateTime, Utc};
use colored::Colorize;

/// One line of the activity
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActivityEntry {
    pub date: Option<DateTime<Utc>>,
    pub state: String,
    pub action: String,
    pub commit: Option<String>,
    pub cause: String,
    /// Whether this is the most recent entry
    pub is_last: bool,
}

impl ActivityEntry {
    pub fn from_deployment(deployment: &Deployment, is_last: bool) -> Self {
        Self {
            date: deployment.date,
            state: deployment.state.as_str().to_string(),
            action: deployment.action.clone().unwrap_or_default(),
            commit: deployment.commit_id.clone(),
            cause: deployment.cause.clone().unwrap_or_default(),
            is_last,
        }
    }

    /// Only deployment action events are part of the activity
    pub fn from_event(event: &PlatformEvent) -> Option<Self> {
        if !event.is_deployment_action() {
            return None;
        }

        Some(Self {
            date: event.date,
            state: event.data.state.clone().unwrap_or_default(),
            action: event.data.action.clone().unwrap_or_default(),
            commit: event.data.commit.clone(),
            cause: event.data.cause.clone().unwrap_or_default(),
            is_last: true,
        })
    }

    /// Temporary entries are replaced by the next one
    pub fn is_temporary(&self) -> bool {
        (self.state == "WIP" && self.is_last) || self.state == "CANCELLED"
    }
}

/// What to print for one entry
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rendering {
    /// Erase the previously printed line first
    pub replace_previous: bool,
    pub line: String,
}

/// Render `entry` after `previous`, returning the new previous entry
pub fn render_entry(
    previous: Option<&ActivityEntry>,
    entry: ActivityEntry,
) -> (ActivityEntry, Rendering) {
    let rendering = Rendering {
        replace_previous: previous.is_some_and(ActivityEntry::is_temporary),
        line: format_activity_line(&entry),
    };
    (entry, rendering)
}

/// Fold one live event into the activity.
///
/// Events that are not deployment actions leave `previous` untouched and
/// render nothing.
pub fn apply_event(
    previous: Option<ActivityEntry>,
    event: &PlatformEvent,
) -> (Option<ActivityEntry>, Option<Rendering>) {
    match ActivityEntry::from_event(event) {
        Some(entry) => {
            let (next, rendering) = render_entry(previous.as_ref(), entry);
            (Some(next), Some(rendering))
        }
        None => (previous, None),
    }
}

/// Render the activity history, oldest entry first
pub fn render_history(deployments_newest_first: &[Deployment]) -> (Option<ActivityEntry>, Vec<Rendering>) {
    let count = deployments_newest_first.len();
    deployments_newest_first
        .iter()
        .rev()
        .enumerate()
        .map(|(index, deployment)| ActivityEntry::from_deployment(deployment, index + 1 == count))
        .fold((None, Vec::with_capacity(count)), |(previous, mut renderings), entry| {
            let (next, rendering) = render_entry(previous.as_ref(), entry);
            renderings.push(rendering);
            (Some(next), renderings)
        })
}

fn colored_state(state: &str, is_last: bool) -> String {
    match state {
        "OK" => state.bold().green().to_string(),
        "FAIL" | "CANCELLED" => state.bold().red().to_string(),
        "WIP" if is_last => "IN PROGRESS".bold().blue().to_string(),
        "WIP" => "FAIL".bold().red().to_string(),
        _ => "UNKNOWN".to_string(),
    }
}

pub fn format_activity_line(entry: &ActivityEntry) -> String {
    let date = entry
        .date
        .map(|date| date.to_rfc3339())
        .unwrap_or_else(|| "-".to_string());

    format!(
        "{:<25}  {:<11}  {:<9}  {:<40}  {}",
        date,
        colored_state(&entry.state, entry.is_last),
        entry.action,
        entry.commit.as_deref().unwrap_or("not specified"),
        entry.cause,
    )
}

/// Print a rendering, erasing the previous line when asked to on a terminal
pub fn print_rendering(rendering: &Rendering) {
    use std::io::IsTerminal;

    if rendering.replace_previous && std::io::stdout().is_terminal() {
        print!("\x1b[1A\r\x1b[2K");
    }
    println!("{}", rendering.line);
}
