//! ABOUTME: Development identity boundary — treats the bearer token as an
//! ABOUTME: opaque user id. A real deployment swaps this for its own IdentityBoundary.

use async_trait::async_trait;
use flowcraft_core::error::{FlowError, Result};
use flowcraft_core::traits::IdentityBoundary;
use flowcraft_core::types::{User, UserId};

/// Accepts any non-empty bearer token and derives a stable user id from it.
/// `spec.md` §6 leaves the identity provider out of scope beyond the
/// `authenticate` contract; this is the placeholder that satisfies it.
pub struct BearerIdentityBoundary;

#[async_trait]
impl IdentityBoundary for BearerIdentityBoundary {
    async fn authenticate(&self, bearer_token: &str) -> Result<(User, UserId)> {
        if bearer_token.trim().is_empty() {
            return Err(FlowError::Unauthorized {
                message: "missing bearer token".to_string(),
            });
        }
        let user_id = bearer_token.to_string();
        let user = User::new(user_id.clone(), format!("{user_id}@flowcraft.local"), user_id.clone());
        Ok((user, user_id))
    }
}
