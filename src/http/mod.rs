//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, route /higlass/{id}/{*rest}, body buffering)
//!     → request.rs (translate into an OutboundRequest)
//!     → net::unix (round trip over <sockets_dir>/<id>)
//!     → response.rs (filter headers, map transport failures)
//!     → Send to client
//! ```

pub mod request;
pub mod response;
pub mod server;

pub use request::OutboundRequest;
pub use response::reconcile;
pub use server::{AppState, HttpServer};
