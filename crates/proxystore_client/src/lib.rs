//! # proxystore client
//!
//! A client-side mirror of state that is authoritatively owned by a
//! separate, privileged context (the "host"), where the only channel
//! between the two is asynchronous message passing.
//!
//! This crate provides:
//! - The [`ProxyStore`]: readiness handshake, full-state replacement,
//!   incremental patches, and correlated dispatch calls
//! - A pluggable [`PatchStrategy`] applied to incoming diffs
//! - A [`Serializer`]/[`Deserializer`] boundary at the transport edge
//! - The [`Transport`] seam and a [`MockTransport`] test double
//!
//! ## Architecture
//!
//! At construction the store sends a FETCH_STATE request and simultaneously
//! starts consuming pushed messages. Whichever produces a full state first
//! resolves readiness, exactly once; no ordering between the two sources is
//! assumed. PATCH_STATE messages that arrive before readiness are queued
//! and drained in arrival order once the first state lands.
//!
//! ## Key invariants
//!
//! - The host is authoritative; the local state is a mirror
//! - State changes only through `replace_state`/`patch_state`, and every
//!   change notifies all registered listeners once, in registration order
//! - Readiness resolves at most once
//! - Envelopes for other channels or with unrecognized kinds are discarded
//!   before any payload handling

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod codec;
mod config;
mod error;
mod listeners;
mod store;
mod strategy;
mod transport;

pub use codec::{CodecError, Deserializer, Identity, Serializer};
pub use config::StoreConfig;
pub use error::{StoreError, StoreResult, HOST_ERROR_PREFIX};
pub use listeners::Subscription;
pub use store::ProxyStore;
pub use strategy::{PatchStrategy, ShallowMerge};
pub use transport::{MockTransport, Transport};
