//! Reverse proxy for HiGlass backends listening on Unix domain sockets.
//!
//! Requests to `<base_url>/higlass/<id>/<rest>` are forwarded to the backend
//! bound at `<sockets_dir>/<id>`, with context headers telling the backend
//! where it is mounted.

pub mod config;
pub mod http;
pub mod lifecycle;
pub mod net;
pub mod observability;
pub mod routing;

pub use config::schema::ProxyConfig;
pub use http::HttpServer;
pub use lifecycle::Shutdown;
