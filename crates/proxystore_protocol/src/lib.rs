//! # proxystore protocol
//!
//! Wire types shared by the proxystore client and host.
//!
//! All traffic between a proxy store and its host, in both directions, is
//! an [`Envelope`]: a message kind, the name of the logical channel the
//! conversation belongs to, and an opaque payload. Several channels may be
//! multiplexed over one transport; receivers filter on the channel name and
//! silently discard everything else.
//!
//! Dispatch requests are answered with a [`Reply`] carrying either a
//! host-reported error or a result value; state fetches are answered with
//! the bare state value.

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod channel;
mod envelope;
mod error;
mod reply;

pub use channel::ChannelName;
pub use envelope::{Envelope, MessageKind};
pub use error::{ProtocolError, ProtocolResult};
pub use reply::Reply;
