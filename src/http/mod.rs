//! HTTP transport
//!
//! [`App::handle`] turns one request into one response without touching a
//! socket, so tests drive it directly; the binary wraps it in a hyper
//! connection per client. The transport resolves the session cookie into a
//! [`RequestContext`], parses JSON bodies and maps [`ApiError`] onto status
//! codes. All access decisions stay in the services.

mod cookies;
mod pages;
mod response;
mod router;

pub use cookies::CookieSpec;
pub use response::HttpResponse;
pub use router::Route;

use crate::config::{ConfigError, ServerConfig};
use crate::core::identity::{MemorySessionStore, SessionStore};
use crate::core::store::Database;
use crate::error::{ApiError, ApiResult};
use crate::services::{AuthReply, RequestContext, Services};
use bytes::Bytes;
use http_body_util::{BodyExt, LengthLimitError, Limited};
use hyper::body::Body;
use hyper::header::{
    HeaderValue, ACCESS_CONTROL_ALLOW_HEADERS, ACCESS_CONTROL_ALLOW_METHODS,
    ACCESS_CONTROL_ALLOW_ORIGIN, SET_COOKIE,
};
use hyper::{Method, Request, StatusCode};
use response::{error_response, json, no_content, not_found, redirect};
use serde::de::DeserializeOwned;
use serde_json::json as json_value;
use std::error::Error as StdError;
use std::sync::Arc;
use tracing::{debug, info};

type BoxError = Box<dyn StdError + Send + Sync>;

const ALLOWED_METHODS: &str = "GET,HEAD,PUT,PATCH,POST,DELETE";

/// Parse a JSON body; an empty body is an empty payload
fn parse_body<T: DeserializeOwned + Default>(body: &Bytes) -> ApiResult<T> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(T::default());
    }
    serde_json::from_slice(body).map_err(|e| {
        debug!("Rejected body: {}", e);
        ApiError::Validation("Invalid JSON body".to_string())
    })
}

/// The HTTP application: routing plus the wired services
#[derive(Clone)]
pub struct App {
    services: Services,
    config: Arc<ServerConfig>,
    cookie: CookieSpec,
    cors_origin: HeaderValue,
}

impl App {
    pub fn new(
        config: ServerConfig,
        db: Database,
        sessions: Arc<dyn SessionStore>,
    ) -> Result<Self, ConfigError> {
        let config = config.validate()?;
        let cors_origin =
            HeaderValue::from_str(&config.cors_allow_origin).map_err(|_| ConfigError::Invalid {
                key: "cors_allow_origin",
                value: config.cors_allow_origin.clone(),
            })?;
        let cookie = CookieSpec {
            name: config.session_cookie.clone(),
            max_age_secs: config.session_ttl_secs,
            secure: config.secure_cookie,
        };
        if config.session_cookie.is_empty() || cookie.clear().is_err() {
            return Err(ConfigError::Invalid {
                key: "session_cookie",
                value: config.session_cookie.clone(),
            });
        }

        Ok(App {
            services: Services::new(db, sessions, &config),
            config: Arc::new(config),
            cookie,
            cors_origin,
        })
    }

    /// An app over fresh in-memory collections and sessions
    pub fn in_memory(config: ServerConfig) -> Result<Self, ConfigError> {
        Self::new(
            config,
            Database::in_memory(),
            Arc::new(MemorySessionStore::new()),
        )
    }

    pub fn services(&self) -> &Services {
        &self.services
    }

    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    /// Answer one request
    pub async fn handle<B>(&self, req: Request<B>) -> HttpResponse
    where
        B: Body,
        B::Error: Into<BoxError>,
    {
        let method = req.method().clone();
        let path = req.uri().path().to_string();

        let mut response = if method == Method::OPTIONS {
            let mut preflight = no_content();
            let headers = preflight.headers_mut();
            headers.insert(
                ACCESS_CONTROL_ALLOW_METHODS,
                HeaderValue::from_static(ALLOWED_METHODS),
            );
            headers.insert(
                ACCESS_CONTROL_ALLOW_HEADERS,
                HeaderValue::from_static("Content-Type"),
            );
            preflight
        } else {
            match Route::resolve(&method, &path) {
                Some(route) => self.route(route, req).await,
                None => not_found(),
            }
        };

        response
            .headers_mut()
            .insert(ACCESS_CONTROL_ALLOW_ORIGIN, self.cors_origin.clone());
        info!("{} {} {}", method, path, response.status().as_u16());
        response
    }

    async fn route<B>(&self, route: Route, req: Request<B>) -> HttpResponse
    where
        B: Body,
        B::Error: Into<BoxError>,
    {
        let token = cookies::read(req.headers(), &self.cookie.name);
        let limited = Limited::new(req.into_body(), self.config.max_body_bytes);
        let body = match limited.collect().await {
            Ok(collected) => collected.to_bytes(),
            Err(e) if e.is::<LengthLimitError>() => {
                debug!("Rejected body over {} bytes", self.config.max_body_bytes);
                return error_response(&ApiError::PayloadTooLarge);
            }
            Err(e) => {
                debug!("Failed to read request body: {}", e);
                return error_response(&ApiError::Validation(
                    "Invalid request body".to_string(),
                ));
            }
        };

        let ctx = if route.is_guarded() {
            match self.context(token).await {
                Ok(ctx) => ctx,
                Err(err) => return error_response(&err),
            }
        } else {
            RequestContext::anonymous().with_token(token)
        };

        match self.dispatch(route, ctx, body).await {
            Ok(response) => response,
            Err(err) => error_response(&err),
        }
    }

    /// Resolve the session; no valid session leaves the context anonymous so
    /// that the policy engine reports the 401
    async fn context(&self, token: Option<String>) -> ApiResult<RequestContext> {
        match self.services.identity.resolve(token.as_deref()).await {
            Ok(principal) => Ok(RequestContext::authenticated(principal).with_token(token)),
            Err(ApiError::Unauthenticated(_)) => Ok(RequestContext::anonymous().with_token(token)),
            Err(err) => Err(err),
        }
    }

    async fn dispatch(
        &self,
        route: Route,
        ctx: RequestContext,
        body: Bytes,
    ) -> ApiResult<HttpResponse> {
        use StatusCode as S;
        let s = &self.services;

        let response = match route {
            Route::Register => {
                let reply = s.auth.register(parse_body(&body)?).await?;
                self.signed_in(S::CREATED, reply)?
            }
            Route::Login => {
                let reply = s.auth.login(parse_body(&body)?).await?;
                self.signed_in(S::OK, reply)?
            }
            Route::Logout => {
                let message = s.auth.logout(&ctx).await?;
                let mut response = json(S::OK, &message);
                let cleared = self
                    .cookie
                    .clear()
                    .map_err(|e| ApiError::internal("Cookie encoding failed", e))?;
                response.headers_mut().insert(SET_COOKIE, cleared);
                response
            }
            Route::Me => match s.auth.me(&ctx).await? {
                Some(info) => json(S::OK, &info),
                None => json(S::UNAUTHORIZED, &json_value!({ "authenticated": false })),
            },

            Route::ListSuppliers => json(S::OK, &s.suppliers.list(&ctx).await?),
            Route::GetSupplier(id) => json(S::OK, &s.suppliers.get(&ctx, &id).await?),
            Route::CreateSupplier => json(
                S::CREATED,
                &s.suppliers.create(&ctx, parse_body(&body)?).await?,
            ),
            Route::UpdateSupplier(id) => json(
                S::OK,
                &s.suppliers.update(&ctx, &id, parse_body(&body)?).await?,
            ),
            Route::DeleteSupplier(id) => json(S::OK, &s.suppliers.delete(&ctx, &id).await?),

            Route::ListProducts => json(S::OK, &s.products.list(&ctx).await?),
            Route::GetProduct(id) => json(S::OK, &s.products.get(&ctx, &id).await?),
            Route::CreateProduct => json(
                S::CREATED,
                &s.products.create(&ctx, parse_body(&body)?).await?,
            ),
            Route::UpdateProduct(id) => json(
                S::OK,
                &s.products.update(&ctx, &id, parse_body(&body)?).await?,
            ),
            Route::DeleteProduct(id) => json(S::OK, &s.products.delete(&ctx, &id).await?),

            Route::ListInventory => json(S::OK, &s.inventory.list(&ctx).await?),
            Route::GetInventory(id) => json(S::OK, &s.inventory.get(&ctx, &id).await?),
            Route::InventoryByProduct(product) => {
                json(S::OK, &s.inventory.by_product(&ctx, &product).await?)
            }
            Route::CreateInventory => json(
                S::CREATED,
                &s.inventory.create(&ctx, parse_body(&body)?).await?,
            ),
            Route::UpdateInventory(id) => json(
                S::OK,
                &s.inventory.update(&ctx, &id, parse_body(&body)?).await?,
            ),
            Route::PatchStock(id) => json(
                S::OK,
                &s.inventory.patch_stock(&ctx, &id, parse_body(&body)?).await?,
            ),
            Route::DeleteInventory(id) => json(S::OK, &s.inventory.delete(&ctx, &id).await?),
            Route::LowStock => json(S::OK, &s.inventory.low_stock(&ctx).await?),

            Route::ListOrders => json(S::OK, &s.orders.list(&ctx).await?),
            Route::GetOrder(id) => json(S::OK, &s.orders.get(&ctx, &id).await?),
            Route::CreateOrder => json(
                S::CREATED,
                &s.orders.create(&ctx, parse_body(&body)?).await?,
            ),
            Route::UpdateOrder(id) => json(
                S::OK,
                &s.orders.update(&ctx, &id, parse_body(&body)?).await?,
            ),
            Route::PatchStatus(id) => json(
                S::OK,
                &s.orders.patch_status(&ctx, &id, parse_body(&body)?).await?,
            ),
            Route::DeleteOrder(id) => json(S::OK, &s.orders.delete(&ctx, &id).await?),

            Route::Dashboard => {
                let role = s
                    .auth
                    .session_role(ctx.session_token.as_deref())
                    .await?
                    .unwrap_or_default();
                redirect(role.dashboard_path())
            }
            Route::Page(file) => pages::serve(&self.config.public_dir, file).await,
        };
        Ok(response)
    }

    fn signed_in(&self, status: StatusCode, reply: AuthReply) -> ApiResult<HttpResponse> {
        let cookie = self
            .cookie
            .issue(&reply.token)
            .map_err(|e| ApiError::internal("Cookie encoding failed", e))?;
        let mut response = json(status, &reply);
        response.headers_mut().insert(SET_COOKIE, cookie);
        Ok(response)
    }
}
