use crate::models::chat::RunStatus;
use log::warn;
use reqwest::StatusCode;
use thiserror::Error;

pub const MSG_BAD_CREDENTIALS: &str = "Usuario o contraseña incorrectos";
pub const MSG_SERVER_ERROR: &str = "Error en el servidor";
pub const MSG_CONNECTION_FAILED: &str = "Error al conectar con el servicio";

pub type Result<T, E = AppError> = std::result::Result<T, E>;

#[derive(Debug, Error)]
pub enum AppError {
    /// Thread or session setup failed. The chat cannot start until it is retried.
    #[error("initialization failed: {0}")]
    Initialization(String),

    #[error("invalid input: {0}")]
    Validation(String),

    /// Bad credentials or a rejected API key.
    #[error("authentication failed: {0}")]
    Auth(String),

    #[error("run finished with status {0}")]
    RunFailed(RunStatus),

    #[error("run did not finish after {attempts} status checks")]
    RunTimeout { attempts: u32 },

    /// No response was received at all. Carries the text shown to the user.
    #[error("network error: {0}")]
    Network(String),

    #[error("HTTP {status}: {message}")]
    Status { status: StatusCode, message: String },

    #[error("configuration error: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serde(#[from] serde_json::Error),

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// Text shown to the person using the application. Never contains
    /// internal detail such as SQL errors or transport failures.
    pub fn user_message(&self) -> String {
        match self {
            AppError::Initialization(_) => {
                "No se pudo iniciar el chat. Recarga e inténtalo de nuevo.".to_string()
            }
            AppError::Validation(message) => message.clone(),
            AppError::Auth(message) => message.clone(),
            AppError::RunFailed(status) => {
                format!("El asistente no pudo responder (estado: {}).", status)
            }
            AppError::RunTimeout { .. } => {
                "El asistente tardó demasiado en responder. Inténtalo de nuevo.".to_string()
            }
            AppError::Network(message) => message.clone(),
            AppError::Status { message, .. } => message.clone(),
            AppError::Config(message) => format!("Configuración inválida: {}", message),
            AppError::Io(e) => format!("Error de archivo: {}", e),
            AppError::Serde(_) | AppError::Database(_) | AppError::Internal(_) => {
                MSG_SERVER_ERROR.to_string()
            }
        }
    }
}

impl From<reqwest::Error> for AppError {
    fn from(err: reqwest::Error) -> Self {
        if let Some(status) = err.status() {
            return AppError::Status { status, message: err.to_string() };
        }
        if err.is_decode() {
            return AppError::Internal(format!("unexpected response body: {}", err));
        }
        warn!("HTTP transport error: {}", err);
        AppError::Network(MSG_CONNECTION_FAILED.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn internal_detail_is_not_shown_to_users() {
        let err = AppError::Internal("pool exhausted at 10.0.0.3".into());
        assert_eq!(err.user_message(), MSG_SERVER_ERROR);
    }

    #[test]
    fn run_failures_name_the_status() {
        let err = AppError::RunFailed(RunStatus::Expired);
        assert!(err.user_message().contains("expired"));
        assert_eq!(err.to_string(), "run finished with status expired");
    }

    #[test]
    fn network_message_is_shown_as_is() {
        let err = AppError::Network("No se recibió respuesta del servidor".into());
        assert_eq!(err.user_message(), "No se recibió respuesta del servidor");
    }

    #[test]
    fn status_message_is_not_prefixed() {
        let err = AppError::Status {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            message: MSG_SERVER_ERROR.into(),
        };
        assert_eq!(err.user_message(), MSG_SERVER_ERROR);
    }

    #[test]
    fn auth_message_passes_through() {
        let err = AppError::Auth(MSG_BAD_CREDENTIALS.into());
        assert_eq!(err.user_message(), MSG_BAD_CREDENTIALS);
    }
}
