//! Clever CLI Library
//!
//! Deployment, log and activity commands for the Clever Cloud platform.

pub mod cli;
pub mod commands;
pub mod config;
pub mod context;
pub mod errors;
pub mod filesys;
pub mod git;
pub mod http;
pub mod logs;
pub mod output;
pub mod stream;
pub mod utils;
pub mod watch;
