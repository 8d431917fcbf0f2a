//! Backend transport subsystem.
//!
//! # Data Flow
//! ```text
//! OutboundRequest (http::request)
//!     → unix.rs (connect <sockets_dir>/<id>, HTTP/1.1 handshake, redirects)
//!     → Ok(InboundResponse) | Err(TransportError)
//!     → http::response (reconcile into client response)
//! ```
//!
//! # Connection Lifecycle
//! ```text
//! Connecting → Handshaking → Exchanging → Closed
//! ```
//! One connection per round trip; nothing is pooled.
//!
//! # Design Decisions
//! - Timeouts are classified by error variant, never by status code
//! - Dropping an in-flight dispatch tears its connection down

pub mod error;
pub mod unix;

pub use error::{TransportError, TransportErrorKind};
pub use unix::{dispatch, DispatchOptions, InboundResponse};
