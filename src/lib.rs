//! Pulls the current month's backups from a remote host over SFTP and keeps
//! only the newest files in the local destination.

pub mod backup;
pub mod cleanup;
pub mod config;
pub mod download;
pub mod error;
pub mod files;
pub mod remote;
pub mod sort;
pub mod ssh;

pub use config::{ConnectionProfile, RetentionThreshold, Settings};
pub use error::{Error, Result};
