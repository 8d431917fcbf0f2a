//! Backend target resolution.
//!
//! # Responsibilities
//! - Accept only all-digit target ids
//! - Map an id onto its socket file under the sockets directory

use std::fmt;
use std::path::{Path, PathBuf};

/// Numeric identifier of a backend, as captured from the request path.
///
/// The digits are kept verbatim: `007` addresses the socket file `007`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TargetId(String);

impl TargetId {
    /// Parse a route segment. Returns `None` unless it is a non-empty run of ASCII digits.
    pub fn parse(segment: &str) -> Option<Self> {
        if !segment.is_empty() && segment.bytes().all(|b| b.is_ascii_digit()) {
            Some(Self(segment.to_string()))
        } else {
            None
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TargetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A backend reachable through a Unix domain socket.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProxyTarget {
    pub id: TargetId,
    pub socket_path: PathBuf,
}

impl ProxyTarget {
    /// Resolve `<sockets_dir>/<id>`. The path is not checked for existence.
    pub fn resolve(sockets_dir: &Path, id: TargetId) -> Self {
        let socket_path = sockets_dir.join(id.as_str());
        Self { id, socket_path }
    }
}
