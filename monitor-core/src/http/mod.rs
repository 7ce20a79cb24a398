//! Authenticated JSON HTTP plumbing for upstream REST APIs.

pub mod client;

pub use client::{ApiClient, BasicAuth, HttpError, MAX_ERROR_BODY_BYTES};
pub use reqwest::Url;
