//! Target routing subsystem.
//!
//! # Data Flow
//! ```text
//! /<base_url>/higlass/<id>/<rest>
//!     → target.rs (validate <id>, resolve <sockets_dir>/<id>)
//!     → mount.rs (compose <base_url>/higlass/<id> for context headers)
//! ```
//!
//! # Design Decisions
//! - Ids are kept as the digit string the route captured
//! - No existence check on sockets; a missing backend surfaces at dispatch

pub mod mount;
pub mod target;

pub use mount::{mount_path, nest_prefix, url_path_join};
pub use target::{ProxyTarget, TargetId};
