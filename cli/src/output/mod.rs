//! Terminal rendering of logs and activity

pub mod activity;

use api_client::models::LogLine;
use colored::Colorize;

/// Program emitting the platform deployer messages
const DEPLOYER_PROGRAM: &str = "/home/bas/rubydeployer/deployer.rb";

fn is_deployer_message(line: &LogLine, prefix: &str) -> bool {
    line.source.syslog_program.as_deref() == Some(DEPLOYER_PROGRAM)
        && line.message().to_lowercase().starts_with(prefix)
}

/// Format a log line, highlighting the deployer milestones
pub fn format_log_line(line: &LogLine) -> String {
    let timestamp = line.timestamp().to_rfc3339();
    let message = line.message();

    if is_deployer_message(line, "successfully deployed in") {
        format!("{}: {}", timestamp, message.bold().green())
    } else if is_deployer_message(line, "deploy failed in") {
        format!("{}: {}", timestamp, message.bold().red())
    } else if is_deployer_message(line, "build succeeded in") {
        format!("{}: {}", timestamp, message.bold().blue())
    } else {
        format!("{}: {}", timestamp, message)
    }
}
