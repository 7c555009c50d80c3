//! REST client for the platform API

pub mod applications;
pub mod client;
pub mod deployments;
pub mod logs;

pub use client::HttpClient;
