//! # Pulse Core
//!
//! The domain layer of the Pulse feed.
//! This crate contains pure business logic with zero infrastructure dependencies:
//! the post model, the ports adapters must implement, similarity ranking, and
//! the feed service that ties them together.

pub mod domain;
pub mod error;
pub mod ports;
pub mod ranking;
pub mod service;

pub use error::{DomainError, RepoError};
