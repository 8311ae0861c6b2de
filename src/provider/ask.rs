use log::{ debug, error };
use reqwest::{ Client as HttpClient, StatusCode };
use serde::{ Deserialize, Serialize };

use crate::error::{ AppError, Result };

pub const MSG_INVALID_KEY: &str = "Error de autenticación: API key inválida";
pub const MSG_MISSING_QUESTION: &str = "Error en la solicitud: Pregunta no proporcionada";
pub const MSG_NO_RESPONSE: &str = "No se recibió respuesta del servidor";

#[derive(Serialize)]
struct AskRequest<'a> {
    question: &'a str,
}

#[derive(Deserialize)]
struct AskResponse {
    answer: String,
}

#[derive(Deserialize)]
struct AskError {
    message: Option<String>,
}

/// Single-shot question/answer backend: one request, one answer, no thread.
#[derive(Clone)]
pub struct AskClient {
    http: HttpClient,
    base_url: String,
    api_key: String,
}

impl AskClient {
    pub fn new(base_url: String, api_key: String) -> Self {
        Self {
            http: HttpClient::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
        }
    }

    pub async fn ask(&self, question: &str) -> Result<String> {
        let url = format!("{}/ask", self.base_url);
        debug!("POST {}", url);
        let resp = self.http
            .post(&url)
            .header("x-api-key", &self.api_key)
            .json(&(AskRequest { question }))
            .send().await
            .map_err(|e| {
                error!("Ask request to {} failed: {}", url, e);
                AppError::Network(MSG_NO_RESPONSE.to_string())
            })?;

        let status = resp.status();
        if status.is_success() {
            let body: AskResponse = resp.json().await?;
            return Ok(body.answer);
        }

        match status {
            StatusCode::FORBIDDEN => Err(AppError::Auth(MSG_INVALID_KEY.to_string())),
            StatusCode::BAD_REQUEST => Err(AppError::Validation(MSG_MISSING_QUESTION.to_string())),
            _ => {
                let message = resp
                    .json::<AskError>().await
                    .ok()
                    .and_then(|e| e.message)
                    .unwrap_or_else(|| "Error del servidor".to_string());
                Err(AppError::Status {
                    status,
                    message: format!("Error del servidor: {}", message),
                })
            }
        }
    }
}
