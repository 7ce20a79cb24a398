//! Workspace two-step verification monitor.
//!
//! Lists every member of a Bitbucket workspace, flags the ones without
//! two-step verification and emails the list to a fixed set of recipients.
pub mod config;
pub mod models;
pub mod services;
pub mod startup;
