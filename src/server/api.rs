use crate::auth::AuthService;
use crate::error::{ AppError, MSG_SERVER_ERROR };
use crate::models::auth::{ ErrorResponse, LoginRequest };
use axum::{
    extract::State,
    http::StatusCode,
    response::{ IntoResponse, Response },
    routing::post,
    Json,
    Router,
};
use governor::{ clock::DefaultClock, state::{ InMemoryState, NotKeyed }, Quota, RateLimiter };
use log::{ error, warn };
use std::num::NonZeroU32;
use std::sync::Arc;
use tower_http::cors::{ Any, CorsLayer };

pub const MSG_TOO_MANY_ATTEMPTS: &str = "Demasiados intentos. Espera un momento.";

type LoginLimiter = RateLimiter<NotKeyed, InMemoryState, DefaultClock>;

#[derive(Clone)]
pub struct AppState {
    auth: Arc<AuthService>,
    limiter: Arc<LoginLimiter>,
}

impl AppState {
    /// `logins_per_second` caps accepted login attempts across all clients.
    pub fn new(auth: Arc<AuthService>, logins_per_second: u32) -> Result<Self, AppError> {
        let rate = NonZeroU32::new(logins_per_second).ok_or_else(||
            AppError::Config("login rate limit must be at least 1 per second".to_string())
        )?;
        Ok(Self {
            auth,
            limiter: Arc::new(RateLimiter::direct(Quota::per_second(rate))),
        })
    }
}

pub fn router(state: AppState) -> Router {
    let cors = CorsLayer::new().allow_origin(Any).allow_methods(Any).allow_headers(Any);

    Router::new().route("/api/login", post(login_handler)).layer(cors).with_state(state)
}

async fn login_handler(State(state): State<AppState>, Json(req): Json<LoginRequest>) -> Response {
    if state.limiter.check().is_err() {
        warn!("Login rate limit exceeded, rejecting attempt for {}", req.username);
        return message_response(StatusCode::TOO_MANY_REQUESTS, MSG_TOO_MANY_ATTEMPTS);
    }

    match state.auth.login(&req.username, &req.password).await {
        Ok(resp) => (StatusCode::OK, Json(resp)).into_response(),
        Err(e) => error_response(e),
    }
}

fn error_response(err: AppError) -> Response {
    match err {
        AppError::Auth(message) => message_response(StatusCode::UNAUTHORIZED, &message),
        other => {
            error!("Login error: {}", other);
            message_response(StatusCode::INTERNAL_SERVER_ERROR, MSG_SERVER_ERROR)
        }
    }
}

fn message_response(status: StatusCode, message: &str) -> Response {
    (status, Json(ErrorResponse { message: message.to_string() })).into_response()
}
