//! Registration, login and session introspection

use crate::config::{ServerConfig, MAX_SESSION_TTL_SECS};
use crate::core::iam::Role;
use crate::core::identity::{Session, SessionStore};
use crate::core::ids::RecordId;
use crate::core::models::{clean, clean_email, LoginInput, PasswordHash, RegisterInput, User, UserProfile};
use crate::core::store::{Collection, Query};
use crate::core::validation::{self, MissingFields};
use crate::error::{ApiError, ApiResult};
use crate::services::{Message, RequestContext};
use chrono::{Duration, Utc};
use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, info, warn};

const DUPLICATE_USER: &str = "User with this email or username already exists";
const BAD_CREDENTIALS: &str = "Invalid credentials";

/// Successful register/login
#[derive(Debug, Clone, Serialize)]
pub struct AuthReply {
    pub message: String,
    pub user: UserProfile,
    /// New session token; travels as a cookie, never in the body
    #[serde(skip)]
    pub token: String,
}

/// `/auth/me` answer for a live session
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionInfo {
    pub authenticated: bool,
    pub user_id: RecordId,
    pub username: String,
    pub role: Role,
}

#[derive(Clone)]
pub struct AuthService {
    users: Arc<dyn Collection<User>>,
    sessions: Arc<dyn SessionStore>,
    ttl: Duration,
    allow_admin_registration: bool,
}

impl AuthService {
    pub fn new(
        users: Arc<dyn Collection<User>>,
        sessions: Arc<dyn SessionStore>,
        config: &ServerConfig,
    ) -> Self {
        AuthService {
            users,
            sessions,
            ttl: Duration::seconds(config.session_ttl_secs.min(MAX_SESSION_TTL_SECS) as i64),
            allow_admin_registration: config.allow_admin_registration,
        }
    }

    /// Create an account and sign it in
    pub async fn register(&self, input: RegisterInput) -> ApiResult<AuthReply> {
        validation::check(&input)?;

        let mut missing = MissingFields::new();
        let username = missing.take("username", clean(input.username));
        let email = missing.take("email", clean_email(input.email));
        let password = missing.take("password", input.password.filter(|p| !p.is_empty()));
        missing.finish()?;
        let (username, email, password) = (
            username.unwrap_or_default(),
            email.unwrap_or_default(),
            password.unwrap_or_default(),
        );

        let role = self.registration_role(input.role.as_deref());

        let (wanted_email, wanted_name) = (email.clone(), username.clone());
        let clash = self
            .users
            .find_one(Query::all().filter(move |u: &User| {
                u.email == wanted_email || u.username == wanted_name
            }))
            .await?;
        if clash.is_some() {
            return Err(ApiError::Validation(DUPLICATE_USER.to_string()));
        }

        let password = PasswordHash::new(&password)
            .map_err(|e| ApiError::internal("Password hashing failed", e))?;
        let user = self
            .users
            .insert(User {
                id: RecordId::new(),
                username,
                email,
                password,
                role,
                created_at: Utc::now(),
            })
            .await?;
        info!("Registered user {} ({})", user.id, user.role);

        self.sign_in(&user, "User registered successfully").await
    }

    /// Check credentials and open a session
    pub async fn login(&self, input: LoginInput) -> ApiResult<AuthReply> {
        let (Some(email), Some(password)) = (clean_email(input.email), input.password) else {
            return Err(ApiError::Unauthenticated(BAD_CREDENTIALS.to_string()));
        };

        let user = self
            .users
            .find_one(Query::all().filter(move |u: &User| u.email == email))
            .await?;

        match user {
            Some(user) if user.password.verify(&password) => {
                info!("User {} logged in", user.id);
                self.sign_in(&user, "Login successful").await
            }
            _ => {
                debug!("Rejected login attempt");
                Err(ApiError::Unauthenticated(BAD_CREDENTIALS.to_string()))
            }
        }
    }

    /// Close the session, if there is one
    pub async fn logout(&self, ctx: &RequestContext) -> ApiResult<Message> {
        if let Some(token) = ctx.session_token.as_deref() {
            self.sessions
                .destroy(token)
                .await
                .map_err(|e| ApiError::internal("Logout failed", e))?;
        }
        Ok(Message::new("Logout successful"))
    }

    /// The live session behind the request, without a user lookup
    pub async fn me(&self, ctx: &RequestContext) -> ApiResult<Option<SessionInfo>> {
        let Some(token) = ctx.session_token.as_deref() else {
            return Ok(None);
        };
        let session = self
            .sessions
            .get(token)
            .await
            .map_err(|e| ApiError::internal("Session lookup failed", e))?;
        Ok(session.map(|s| SessionInfo {
            authenticated: true,
            user_id: s.user_id,
            username: s.username,
            role: s.role,
        }))
    }

    /// Role of the session behind `token`, for the dashboard redirect
    pub async fn session_role(&self, token: Option<&str>) -> ApiResult<Option<Role>> {
        let ctx = RequestContext::anonymous().with_token(token.map(str::to_string));
        Ok(self.me(&ctx).await?.map(|info| info.role))
    }

    fn registration_role(&self, requested: Option<&str>) -> Role {
        match requested.and_then(|r| r.parse::<Role>().ok()) {
            Some(Role::Admin) if !self.allow_admin_registration => {
                warn!("Admin registration disabled; registering as user");
                Role::User
            }
            Some(role) => role,
            None => Role::User,
        }
    }

    async fn sign_in(&self, user: &User, message: &str) -> ApiResult<AuthReply> {
        let token = self
            .sessions
            .create(Session::for_user(user, self.ttl))
            .await
            .map_err(|e| ApiError::internal("Session creation failed", e))?;
        Ok(AuthReply {
            message: message.to_string(),
            user: user.profile(),
            token,
        })
    }
}
