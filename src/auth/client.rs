use log::{ debug, info };
use reqwest::{ Client as HttpClient, StatusCode };

use crate::error::{ AppError, Result, MSG_BAD_CREDENTIALS };
use crate::models::auth::{ ErrorResponse, LoginRequest, LoginResponse, Session };

pub const MSG_LOGIN_FAILED: &str = "Error en el inicio de sesión";

/// Talks to the login endpoint and keeps the session of the last successful login.
pub struct AuthClient {
    http: HttpClient,
    base_url: String,
    session: Option<Session>,
}

impl AuthClient {
    pub fn new(base_url: &str) -> Self {
        Self {
            http: HttpClient::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            session: None,
        }
    }

    pub fn session(&self) -> Option<&Session> {
        self.session.as_ref()
    }

    pub fn logout(&mut self) {
        self.session = None;
    }

    /// On failure the previously stored session, if any, is left untouched.
    pub async fn login(&mut self, username: &str, password: &str) -> Result<&Session> {
        let url = format!("{}/api/login", self.base_url);
        debug!("POST {}", url);
        let body = LoginRequest { username: username.to_string(), password: password.to_string() };
        let resp = self.http.post(&url).json(&body).send().await?;

        let status = resp.status();
        if status.is_success() {
            let login: LoginResponse = resp.json().await?;
            info!("Logged in as {}", login.username);
            return Ok(self.session.insert(Session::from(login)));
        }

        let message = resp
            .json::<ErrorResponse>().await
            .map(|e| e.message)
            .ok();
        match status {
            StatusCode::UNAUTHORIZED => {
                Err(AppError::Auth(message.unwrap_or_else(|| MSG_BAD_CREDENTIALS.to_string())))
            }
            _ =>
                Err(AppError::Status {
                    status,
                    message: message.unwrap_or_else(|| MSG_LOGIN_FAILED.to_string()),
                }),
        }
    }
}
