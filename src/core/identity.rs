//! Sessions and identity resolution
//!
//! A session token maps to the id, name and role stored at login. The
//! resolver turns a token into a [`Principal`] by re-loading the user, so a
//! deleted account stops authenticating at once.

use crate::core::iam::{Principal, Role};
use crate::core::ids::RecordId;
use crate::core::models::User;
use crate::core::store::{Collection, StoreError, StoreResult};
use crate::error::{ApiError, ApiResult};
use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use parking_lot::RwLock;
use rand::RngCore;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::debug;

/// Data kept per session
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub user_id: RecordId,
    pub username: String,
    pub role: Role,
    pub expires_at: DateTime<Utc>,
}

impl Session {
    /// Session for `user` valid for `ttl` from now
    pub fn for_user(user: &User, ttl: Duration) -> Self {
        Session {
            user_id: user.id,
            username: user.username.clone(),
            role: user.role,
            expires_at: Utc::now() + ttl,
        }
    }

    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }
}

/// Storage for sessions; written only at login and logout
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Store a session and return its new token
    async fn create(&self, session: Session) -> StoreResult<String>;

    /// Look up a live session
    async fn get(&self, token: &str) -> StoreResult<Option<Session>>;

    /// Remove a session; removing an unknown token is not an error
    async fn destroy(&self, token: &str) -> StoreResult<()>;
}

/// 256-bit random session token, hex encoded
pub fn new_token() -> String {
    let mut bytes = [0u8; 32];
    rand::thread_rng().fill_bytes(&mut bytes);
    hex::encode(bytes)
}

/// Session count at which `create` sweeps out expired entries
const SWEEP_THRESHOLD: usize = 1024;

/// Session store held in process memory
pub struct MemorySessionStore {
    sessions: RwLock<HashMap<String, Session>>,
    fault: RwLock<Option<String>>,
    sweep_threshold: usize,
}

impl Default for MemorySessionStore {
    fn default() -> Self {
        Self::with_sweep_threshold(SWEEP_THRESHOLD)
    }
}

impl MemorySessionStore {
    pub fn new() -> Self {
        MemorySessionStore::default()
    }

    /// A store that drops expired sessions once it holds `threshold` entries
    pub fn with_sweep_threshold(threshold: usize) -> Self {
        MemorySessionStore {
            sessions: RwLock::new(HashMap::new()),
            fault: RwLock::new(None),
            sweep_threshold: threshold,
        }
    }

    /// Make every following operation fail, or clear the fault
    pub fn set_fault(&self, fault: Option<&str>) {
        *self.fault.write() = fault.map(str::to_string);
    }

    pub fn len(&self) -> usize {
        self.sessions.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.read().is_empty()
    }

    fn check_fault(&self) -> StoreResult<()> {
        match self.fault.read().as_ref() {
            Some(reason) => Err(StoreError::Unavailable(reason.clone())),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl SessionStore for MemorySessionStore {
    async fn create(&self, session: Session) -> StoreResult<String> {
        self.check_fault()?;
        let token = new_token();
        let mut sessions = self.sessions.write();
        if sessions.len() >= self.sweep_threshold {
            let now = Utc::now();
            let before = sessions.len();
            sessions.retain(|_, s| !s.is_expired(now));
            debug!("Swept {} expired sessions", before - sessions.len());
        }
        sessions.insert(token.clone(), session);
        Ok(token)
    }

    async fn get(&self, token: &str) -> StoreResult<Option<Session>> {
        self.check_fault()?;
        let now = Utc::now();
        let mut sessions = self.sessions.write();
        match sessions.get(token) {
            Some(session) if session.is_expired(now) => {
                sessions.remove(token);
                debug!("Session expired");
                Ok(None)
            }
            found => Ok(found.cloned()),
        }
    }

    async fn destroy(&self, token: &str) -> StoreResult<()> {
        self.check_fault()?;
        self.sessions.write().remove(token);
        Ok(())
    }
}

/// Resolves session tokens to principals
#[derive(Clone)]
pub struct IdentityResolver {
    sessions: Arc<dyn SessionStore>,
    users: Arc<dyn Collection<User>>,
}

impl IdentityResolver {
    pub fn new(sessions: Arc<dyn SessionStore>, users: Arc<dyn Collection<User>>) -> Self {
        IdentityResolver { sessions, users }
    }

    /// Resolve the acting principal
    ///
    /// - no token or no live session: `Unauthenticated`
    /// - session user deleted: `UserGone`
    /// - lookup fault: `Internal`
    pub async fn resolve(&self, token: Option<&str>) -> ApiResult<Principal> {
        let token = token.ok_or_else(ApiError::unauthenticated)?;

        let session = self
            .sessions
            .get(token)
            .await
            .map_err(|e| ApiError::internal("Session lookup failed", e))?
            .ok_or_else(ApiError::unauthenticated)?;

        let user = self
            .users
            .get(&session.user_id)
            .await
            .map_err(|e| ApiError::internal("User lookup failed", e))?
            .ok_or_else(|| {
                debug!("Session refers to missing user {}", session.user_id);
                ApiError::UserGone
            })?;

        Ok(user.principal())
    }
}
