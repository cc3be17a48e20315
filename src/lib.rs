//! qualtrics-sync - survey response sync pipeline
//!
//! This crate provides the core functionality for the `qsync` CLI tool:
//! a poll loop that drives Qualtrics asynchronous export jobs, a
//! change-aware SQLite store whose status column doubles as the pending
//! queue for downstream consumers, and an optional webhook listener for
//! push-path ingestion.
//!
//! # Architecture
//!
//! - [`cli`] - Command-line interface using clap
//! - [`config`] - Environment configuration and database path resolution
//! - [`model`] - Domain types (Response, ScanStatus)
//! - [`storage`] - SQLite database layer
//! - [`qualtrics`] - Export API client
//! - [`extract`] - ZIP/CSV archive extraction
//! - [`poller`] - Poll cycle orchestration
//! - [`webhook`] - Push-path HTTP listener
//! - [`error`] - Error types and handling

#![forbid(unsafe_code)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod cli;
pub mod config;
pub mod error;
pub mod extract;
pub mod model;
pub mod poller;
pub mod qualtrics;
pub mod storage;
pub mod webhook;

pub use error::{Error, Result};
