use std::sync::Arc;

use async_trait::async_trait;
use tracing::{info, warn};

use crate::config::ResetDeliveryMode;
use crate::users::repo_types::User;

/// Channel a password-reset token travels through.
#[async_trait]
pub trait ResetTokenDelivery: Send + Sync {
    /// Hand the token over. Returns it only if the channel is the HTTP
    /// response itself.
    async fn deliver(&self, user: &User, token: String) -> anyhow::Result<Option<String>>;
}

/// Echoes the token back to the caller. Development only.
pub struct InlineDelivery;

#[async_trait]
impl ResetTokenDelivery for InlineDelivery {
    async fn deliver(&self, user: &User, token: String) -> anyhow::Result<Option<String>> {
        info!(user_id = %user.id, "reset token returned inline");
        Ok(Some(token))
    }
}

/// Drops the token. Used when no out-of-band channel is configured.
pub struct SuppressedDelivery;

#[async_trait]
impl ResetTokenDelivery for SuppressedDelivery {
    async fn deliver(&self, user: &User, _token: String) -> anyhow::Result<Option<String>> {
        warn!(user_id = %user.id, "reset token issued but no delivery channel configured");
        Ok(None)
    }
}

pub fn from_mode(mode: ResetDeliveryMode) -> Arc<dyn ResetTokenDelivery> {
    match mode {
        ResetDeliveryMode::Inline => Arc::new(InlineDelivery),
        ResetDeliveryMode::Suppressed => Arc::new(SuppressedDelivery),
    }
}
