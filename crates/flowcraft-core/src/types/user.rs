//! ABOUTME: User identity and per-user connected-service bookkeeping

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Opaque user identifier issued by the identity boundary (out of scope for this core).
pub type UserId = String;

/// Authenticated user as seen by the engine.
///
/// Created on first authenticated call; mutated only by the token manager
/// and the identity boundary. The core never deletes a `User`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct User {
    pub id: UserId,
    pub email: String,
    pub name: String,
    /// Third-party provider name (e.g. `"google"`) -> opaque credential reference.
    /// The credential value itself lives in the Token Manager, never here.
    #[serde(default)]
    pub credentials: HashMap<String, String>,
    /// Service identifiers the user has connected (drives `user_capabilities`).
    #[serde(default)]
    pub connected_services: Vec<String>,
}

impl User {
    pub fn new(id: impl Into<String>, email: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            email: email.into(),
            name: name.into(),
            credentials: HashMap::new(),
            connected_services: Vec::new(),
        }
    }

    pub fn has_connected(&self, service: &str) -> bool {
        self.connected_services.iter().any(|s| s == service)
    }
}
