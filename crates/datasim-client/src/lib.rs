//! HTTP client, job poller, and artifact downloads for Datasim.
//!
//! This crate talks to the generation backend: OTP authentication,
//! synchronous and asynchronous submissions, job status polling to a
//! terminal state, and downloads of the generated files.

pub mod client;
pub mod config;
pub mod download;
pub mod error;
pub mod poller;
pub mod session;

pub use client::{ApiClient, StatusSource};
pub use config::ClientConfig;
pub use download::{filename_of, Downloader};
pub use error::ClientError;
pub use poller::{JobPoller, JobTracker, PollEvent, PollHandle, PollOptions};
pub use session::Session;
