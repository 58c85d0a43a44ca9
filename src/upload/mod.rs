//! # Upload Module
//!
//! Pushes finished videos to YouTube over the resumable upload protocol:
//! one request opens the session and carries the metadata, a second streams
//! the file bytes to the returned session URL.

pub mod client;

pub use client::VideoPublisher;
