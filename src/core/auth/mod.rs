// ─── Launch Identity ───
// The core never authenticates. It consumes an opaque identity produced by an
// external provider and never persists it.

use async_trait::async_trait;

use crate::core::error::LauncherResult;

pub const OFFLINE_UUID: &str = "00000000-0000-0000-0000-000000000000";
pub const OFFLINE_ACCESS_TOKEN: &str = "offline_access_token";

/// `(username, user_id, access_token)` as handed over by the auth provider.
#[derive(Clone, PartialEq, Eq)]
pub struct LaunchIdentity {
    pub username: String,
    /// UUID, usually hyphenated.
    pub user_id: String,
    pub access_token: String,
}

impl LaunchIdentity {
    pub fn new(
        username: impl Into<String>,
        user_id: impl Into<String>,
        access_token: impl Into<String>,
    ) -> Self {
        Self {
            username: username.into(),
            user_id: user_id.into(),
            access_token: access_token.into(),
        }
    }

    /// Placeholder identity for unauthenticated play.
    pub fn offline(username: &str) -> Self {
        let username = username.trim();
        Self::new(
            if username.is_empty() { "Player" } else { username },
            OFFLINE_UUID,
            OFFLINE_ACCESS_TOKEN,
        )
    }

    /// User id as passed on the command line: hyphens stripped.
    pub fn command_uuid(&self) -> String {
        self.user_id.replace('-', "")
    }
}

// The access token must never end up in logs.
impl std::fmt::Debug for LaunchIdentity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LaunchIdentity")
            .field("username", &self.username)
            .field("user_id", &self.user_id)
            .field("access_token", &"<redacted>")
            .finish()
    }
}

/// External authentication collaborator.
///
/// Implementations run password or device-code flows elsewhere and report
/// failures as [`crate::core::error::LauncherError::Auth`].
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    async fn identity(&self) -> LauncherResult<LaunchIdentity>;
}

/// Provider wrapping an identity that was already obtained.
#[derive(Debug, Clone)]
pub struct StaticIdentity(pub LaunchIdentity);

#[async_trait]
impl IdentityProvider for StaticIdentity {
    async fn identity(&self) -> LauncherResult<LaunchIdentity> {
        Ok(self.0.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn command_uuid_strips_hyphens() {
        let identity = LaunchIdentity::new(
            "Steve",
            "11112222-3333-4444-5555-666677778888",
            "token",
        );
        assert_eq!(identity.command_uuid(), "11112222333344445555666677778888");
    }

    #[test]
    fn offline_identity_defaults_blank_names() {
        let identity = LaunchIdentity::offline("  ");
        assert_eq!(identity.username, "Player");
        assert_eq!(identity.command_uuid(), "00000000000000000000000000000000");
    }

    #[test]
    fn debug_output_redacts_the_token() {
        let identity = LaunchIdentity::new("Alex", OFFLINE_UUID, "secret-token");
        let rendered = format!("{identity:?}");
        assert!(rendered.contains("Alex"));
        assert!(!rendered.contains("secret-token"));
    }

    #[tokio::test]
    async fn static_provider_hands_back_its_identity() {
        let provider = StaticIdentity(LaunchIdentity::offline("Alex"));
        let identity = provider.identity().await.unwrap();
        assert_eq!(identity.username, "Alex");
    }
}
