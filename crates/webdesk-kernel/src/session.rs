//! Identity and profile collaborator.
//!
//! Authentication lives outside the host. The host only needs to know at
//! boot whether there is a session and whose it is, and to hear about
//! sign-outs afterwards.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;
use tokio::sync::broadcast;
use tracing::info;

/// Errors from an identity provider.
#[derive(Debug, Error)]
pub enum IdentityError {
    /// The operation needs a user the provider does not know.
    #[error("Unknown user: {0}")]
    UnknownUser(String),

    /// A patch had the wrong shape.
    #[error("Invalid update: {0}")]
    InvalidUpdate(String),

    /// The backing service failed.
    #[error("Identity backend error: {0}")]
    Backend(String),
}

/// Result type for identity operations.
pub type IdentityResult<T> = Result<T, IdentityError>;

/// An authenticated session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    /// Owner of the session.
    pub user_id: String,
    /// Bearer token.
    pub access_token: String,
    /// When the token stops being valid.
    pub expires_at: Option<DateTime<Utc>>,
}

/// A user's public profile.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProfile {
    /// User id.
    pub id: String,
    /// Chosen username.
    pub username: Option<String>,
    /// Avatar image URL.
    pub avatar_url: Option<String>,
    /// Last profile update.
    pub updated_at: DateTime<Utc>,
}

impl UserProfile {
    /// Name shown in the menu bar.
    #[must_use]
    pub fn display_name(&self) -> &str {
        self.username
            .as_deref()
            .filter(|n| !n.is_empty())
            .unwrap_or("User")
    }

    /// Upper-cased first letter of the display name, for the avatar badge.
    #[must_use]
    pub fn initial(&self) -> String {
        self.display_name()
            .chars()
            .next()
            .map(|c| c.to_uppercase().collect())
            .unwrap_or_else(|| "U".to_owned())
    }
}

/// Fields of a profile update. `None` leaves a field as it is.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProfileUpdate {
    /// New username.
    pub username: Option<String>,
    /// New avatar URL.
    pub avatar_url: Option<String>,
}

/// A change in authentication state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthEvent {
    /// A user signed in.
    SignedIn(Option<Session>),
    /// The user signed out.
    SignedOut(Option<Session>),
    /// The access token was renewed.
    TokenRefreshed(Option<Session>),
}

impl AuthEvent {
    /// The session carried by the event.
    #[must_use]
    pub fn session(&self) -> Option<&Session> {
        match self {
            Self::SignedIn(s) | Self::SignedOut(s) | Self::TokenRefreshed(s) => s.as_ref(),
        }
    }

    /// Whether the host must give up control.
    #[must_use]
    pub fn ends_session(&self) -> bool {
        matches!(self, Self::SignedOut(_)) || self.session().is_none()
    }
}

/// The identity and profile service the host consumes.
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// The current session, if any.
    async fn check_session(&self) -> IdentityResult<Option<Session>>;

    /// Profile of the signed-in user, if any.
    async fn current_user(&self) -> IdentityResult<Option<UserProfile>>;

    /// Stored preferences for `user_id`. Empty object when none exist.
    async fn user_preferences(&self, user_id: &str) -> IdentityResult<Value>;

    /// Apply `update` to the profile of `user_id` and return the result.
    async fn update_user_profile(
        &self,
        user_id: &str,
        update: ProfileUpdate,
    ) -> IdentityResult<UserProfile>;

    /// Merge `patch` (a JSON object) into the preferences of `user_id`.
    async fn update_user_preferences(&self, user_id: &str, patch: Value) -> IdentityResult<Value>;

    /// End the current session.
    async fn sign_out(&self) -> IdentityResult<()>;

    /// Subscribe to authentication state changes.
    fn subscribe(&self) -> broadcast::Receiver<AuthEvent>;
}

// ---------------------------------------------------------------------------
// In-memory provider
// ---------------------------------------------------------------------------

#[derive(Debug, Default)]
struct IdentityState {
    session: Option<Session>,
    profiles: HashMap<String, UserProfile>,
    preferences: HashMap<String, Map<String, Value>>,
}

/// An [`IdentityProvider`] that keeps everything in memory.
#[derive(Debug, Clone)]
pub struct InMemoryIdentityProvider {
    state: Arc<RwLock<IdentityState>>,
    events: broadcast::Sender<AuthEvent>,
}

impl Default for InMemoryIdentityProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryIdentityProvider {
    /// A provider with nobody signed in.
    #[must_use]
    pub fn new() -> Self {
        let (events, _) = broadcast::channel(16);
        Self {
            state: Arc::new(RwLock::new(IdentityState::default())),
            events,
        }
    }

    /// A provider with `username` already signed in.
    #[must_use]
    pub fn signed_in(user_id: impl Into<String>, username: impl Into<String>) -> Self {
        let provider = Self::new();
        provider.sign_in(user_id, username);
        provider
    }

    /// Sign a user in, creating the profile if needed, and notify
    /// subscribers.
    pub fn sign_in(&self, user_id: impl Into<String>, username: impl Into<String>) -> Session {
        let user_id = user_id.into();
        let session = Session {
            user_id: user_id.clone(),
            access_token: format!("local-{user_id}"),
            expires_at: None,
        };
        {
            let mut state = self.write();
            state
                .profiles
                .entry(user_id.clone())
                .or_insert_with(|| UserProfile {
                    id: user_id.clone(),
                    username: Some(username.into()),
                    avatar_url: None,
                    updated_at: Utc::now(),
                });
            state.session = Some(session.clone());
        }
        let _ = self.events.send(AuthEvent::SignedIn(Some(session.clone())));
        session
    }

    /// Publish an arbitrary auth event.
    pub fn emit(&self, event: AuthEvent) {
        let _ = self.events.send(event);
    }

    /// Remove a profile while keeping the session.
    pub fn forget_profile(&self, user_id: &str) {
        self.write().profiles.remove(user_id);
    }

    fn read(&self) -> std::sync::RwLockReadGuard<'_, IdentityState> {
        self.state
            .read()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }

    fn write(&self) -> std::sync::RwLockWriteGuard<'_, IdentityState> {
        self.state
            .write()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }
}

#[async_trait]
impl IdentityProvider for InMemoryIdentityProvider {
    async fn check_session(&self) -> IdentityResult<Option<Session>> {
        Ok(self.read().session.clone())
    }

    async fn current_user(&self) -> IdentityResult<Option<UserProfile>> {
        let state = self.read();
        let profile = state
            .session
            .as_ref()
            .and_then(|s| state.profiles.get(&s.user_id))
            .cloned();
        Ok(profile)
    }

    async fn user_preferences(&self, user_id: &str) -> IdentityResult<Value> {
        let prefs = self.read().preferences.get(user_id).cloned();
        Ok(Value::Object(prefs.unwrap_or_default()))
    }

    async fn update_user_profile(
        &self,
        user_id: &str,
        update: ProfileUpdate,
    ) -> IdentityResult<UserProfile> {
        let mut state = self.write();
        let profile = state
            .profiles
            .get_mut(user_id)
            .ok_or_else(|| IdentityError::UnknownUser(user_id.to_owned()))?;
        if let Some(username) = update.username {
            profile.username = Some(username);
        }
        if let Some(avatar_url) = update.avatar_url {
            profile.avatar_url = Some(avatar_url);
        }
        profile.updated_at = Utc::now();
        Ok(profile.clone())
    }

    async fn update_user_preferences(&self, user_id: &str, patch: Value) -> IdentityResult<Value> {
        let Value::Object(patch) = patch else {
            return Err(IdentityError::InvalidUpdate(
                "preferences patch must be an object".to_owned(),
            ));
        };
        let mut state = self.write();
        if !state.profiles.contains_key(user_id) {
            return Err(IdentityError::UnknownUser(user_id.to_owned()));
        }
        let prefs = state.preferences.entry(user_id.to_owned()).or_default();
        prefs.extend(patch);
        Ok(Value::Object(prefs.clone()))
    }

    async fn sign_out(&self) -> IdentityResult<()> {
        let previous = self.write().session.take();
        if let Some(session) = &previous {
            info!(user_id = %session.user_id, "Signed out");
        }
        let _ = self.events.send(AuthEvent::SignedOut(None));
        Ok(())
    }

    fn subscribe(&self) -> broadcast::Receiver<AuthEvent> {
        self.events.subscribe()
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[tokio::test]
    async fn test_signed_in_provider_reports_session_and_profile() {
        let provider = InMemoryIdentityProvider::signed_in("u1", "ada");
        let session = provider.check_session().await.unwrap().unwrap();
        assert_eq!(session.user_id, "u1");

        let profile = provider.current_user().await.unwrap().unwrap();
        assert_eq!(profile.display_name(), "ada");
        assert_eq!(profile.initial(), "A");
    }

    #[tokio::test]
    async fn test_no_session_means_no_user() {
        let provider = InMemoryIdentityProvider::new();
        assert!(provider.check_session().await.unwrap().is_none());
        assert!(provider.current_user().await.unwrap().is_none());
    }

    #[test]
    fn test_display_name_fallback() {
        let profile = UserProfile {
            id: "u".into(),
            username: Some(String::new()),
            avatar_url: None,
            updated_at: Utc::now(),
        };
        assert_eq!(profile.display_name(), "User");
        assert_eq!(profile.initial(), "U");
    }

    #[tokio::test]
    async fn test_update_profile() {
        let provider = InMemoryIdentityProvider::signed_in("u1", "ada");
        let updated = provider
            .update_user_profile(
                "u1",
                ProfileUpdate {
                    username: Some("grace".into()),
                    avatar_url: None,
                },
            )
            .await
            .unwrap();
        assert_eq!(updated.username.as_deref(), Some("grace"));

        let err = provider
            .update_user_profile("nobody", ProfileUpdate::default())
            .await
            .unwrap_err();
        assert!(matches!(err, IdentityError::UnknownUser(_)));
    }

    #[tokio::test]
    async fn test_preferences_merge() {
        let provider = InMemoryIdentityProvider::signed_in("u1", "ada");
        assert_eq!(provider.user_preferences("u1").await.unwrap(), json!({}));

        provider
            .update_user_preferences("u1", json!({"theme": "dark", "dock": 5}))
            .await
            .unwrap();
        let merged = provider
            .update_user_preferences("u1", json!({"theme": "light"}))
            .await
            .unwrap();
        assert_eq!(merged, json!({"theme": "light", "dock": 5}));

        assert!(matches!(
            provider.update_user_preferences("u1", json!([1])).await,
            Err(IdentityError::InvalidUpdate(_))
        ));
    }

    #[tokio::test]
    async fn test_sign_out_notifies_subscribers() {
        let provider = InMemoryIdentityProvider::signed_in("u1", "ada");
        let mut rx = provider.subscribe();

        provider.sign_out().await.unwrap();
        let event = rx.recv().await.unwrap();
        assert!(event.ends_session());
        assert!(provider.check_session().await.unwrap().is_none());
    }

    #[test]
    fn test_ends_session() {
        let session = Session {
            user_id: "u".into(),
            access_token: "t".into(),
            expires_at: None,
        };
        assert!(!AuthEvent::TokenRefreshed(Some(session.clone())).ends_session());
        assert!(AuthEvent::TokenRefreshed(None).ends_session());
        assert!(AuthEvent::SignedOut(Some(session)).ends_session());
    }
}
