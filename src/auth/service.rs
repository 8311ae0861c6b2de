use log::{ info, warn };
use std::sync::Arc;

use super::password::verify_password;
use super::store::CredentialStore;
use super::token::TokenSigner;
use crate::error::{ AppError, Result, MSG_BAD_CREDENTIALS };
use crate::models::auth::{ Claims, LoginResponse };

pub struct AuthService {
    store: Arc<dyn CredentialStore>,
    signer: TokenSigner,
}

impl AuthService {
    pub fn new(store: Arc<dyn CredentialStore>, signer: TokenSigner) -> Self {
        Self { store, signer }
    }

    /// Unknown user and wrong password produce the same error.
    pub async fn login(&self, username: &str, password: &str) -> Result<LoginResponse> {
        let user = match self.store.find_by_username(username).await? {
            Some(user) => user,
            None => {
                warn!("Login failed, unknown user: {}", username);
                return Err(AppError::Auth(MSG_BAD_CREDENTIALS.to_string()));
            }
        };

        if !verify_password(password, &user.password_hash)? {
            warn!("Login failed, wrong password for user: {}", username);
            return Err(AppError::Auth(MSG_BAD_CREDENTIALS.to_string()));
        }

        let token = self.signer.issue(user.id, &user.username)?;
        info!("Login succeeded for user: {}", username);
        Ok(LoginResponse { token, username: user.username })
    }

    pub fn verify(&self, token: &str) -> Result<Claims> {
        self.signer.verify(token)
    }
}
