//! Command implementations

pub mod activity;
pub mod deploy;
pub mod logs;
pub mod restart;
