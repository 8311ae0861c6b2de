use base64::{ engine::general_purpose::URL_SAFE_NO_PAD, Engine as _ };
use chrono::Utc;
use hmac::{ Hmac, Mac };
use sha2::Sha256;

use crate::error::{ AppError, Result };
use crate::models::auth::Claims;

type HmacSha256 = Hmac<Sha256>;

pub const DEFAULT_TTL_SECS: i64 = 3600;
const HEADER: &str = r#"{"alg":"HS256","typ":"JWT"}"#;

/// Issues and checks HS256 JSON Web Tokens.
#[derive(Clone)]
pub struct TokenSigner {
    secret: Vec<u8>,
    ttl_secs: i64,
}

impl TokenSigner {
    pub fn new(secret: &str, ttl_secs: i64) -> Result<Self> {
        if secret.is_empty() {
            return Err(AppError::Config("JWT secret must not be empty".to_string()));
        }
        if ttl_secs <= 0 {
            return Err(AppError::Config(format!("token lifetime must be positive, got {}", ttl_secs)));
        }
        Ok(Self { secret: secret.as_bytes().to_vec(), ttl_secs })
    }

    pub fn ttl_secs(&self) -> i64 {
        self.ttl_secs
    }

    pub fn issue(&self, user_id: i64, username: &str) -> Result<String> {
        self.issue_at(user_id, username, Utc::now().timestamp())
    }

    pub fn issue_at(&self, user_id: i64, username: &str, now: i64) -> Result<String> {
        let claims = Claims {
            user_id,
            username: username.to_string(),
            iat: now,
            exp: now + self.ttl_secs,
        };
        let header = URL_SAFE_NO_PAD.encode(HEADER);
        let payload = URL_SAFE_NO_PAD.encode(serde_json::to_vec(&claims)?);
        let signing_input = format!("{}.{}", header, payload);
        let signature = URL_SAFE_NO_PAD.encode(self.mac(&signing_input)?.finalize().into_bytes());
        Ok(format!("{}.{}", signing_input, signature))
    }

    pub fn verify(&self, token: &str) -> Result<Claims> {
        self.verify_at(token, Utc::now().timestamp())
    }

    pub fn verify_at(&self, token: &str, now: i64) -> Result<Claims> {
        let invalid = || AppError::Auth("Token inválido".to_string());
        let mut parts = token.split('.');
        let (header, payload, signature) = match (parts.next(), parts.next(), parts.next(), parts.next()) {
            (Some(h), Some(p), Some(s), None) => (h, p, s),
            _ => {
                return Err(invalid());
            }
        };

        let signature = URL_SAFE_NO_PAD.decode(signature).map_err(|_| invalid())?;
        self.mac(&format!("{}.{}", header, payload))?
            .verify_slice(&signature)
            .map_err(|_| invalid())?;

        let header = URL_SAFE_NO_PAD.decode(header).map_err(|_| invalid())?;
        let header: serde_json::Value = serde_json::from_slice(&header).map_err(|_| invalid())?;
        if header.get("alg").and_then(|a| a.as_str()) != Some("HS256") {
            return Err(invalid());
        }

        let payload = URL_SAFE_NO_PAD.decode(payload).map_err(|_| invalid())?;
        let claims: Claims = serde_json::from_slice(&payload).map_err(|_| invalid())?;
        if claims.exp <= now {
            return Err(AppError::Auth("Token expirado".to_string()));
        }
        Ok(claims)
    }

    fn mac(&self, input: &str) -> Result<HmacSha256> {
        let mut mac = HmacSha256::new_from_slice(&self.secret).map_err(|e|
            AppError::Internal(format!("invalid HMAC key: {}", e))
        )?;
        mac.update(input.as_bytes());
        Ok(mac)
    }
}
