//! Polite image downloader.
//!
//! One sequential pipeline per URL: probe and validate headers, stream the
//! body under a size cap, dedupe by content hash, persist under a
//! collision-free name, report the outcome.

pub mod config;
pub mod error;
pub mod fetcher;
pub mod http;
pub mod mime;
pub mod naming;
pub mod output;
pub mod registry;
