//! # proxystore host
//!
//! Reference in-memory host for the proxystore protocol.
//!
//! A [`Host`] owns the authoritative state for any number of named
//! channels, answers FETCH_STATE and DISPATCH requests, and broadcasts
//! STATE / PATCH_STATE envelopes to every subscribed push feed. Mutation
//! logic is supplied per channel through a [`DispatchHandler`].
//!
//! This crate exists for integration testing and as the model other host
//! implementations follow; it has no persistence and no network layer.

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod error;
mod handler;
mod host;

pub use error::{HostError, HostResult};
pub use handler::{DispatchHandler, DispatchOutcome, RejectAll};
pub use host::Host;
