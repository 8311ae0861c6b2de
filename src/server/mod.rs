pub mod api;

use crate::error::AppError;
use log::{ error, info };
use std::error::Error;
use std::net::SocketAddr;

pub use self::api::{ router, AppState };

#[derive(Debug, Clone, Default)]
pub struct TlsPaths {
    pub cert_path: String,
    pub key_path: String,
}

pub struct Server {
    addr: String,
    state: AppState,
    tls: Option<TlsPaths>,
}

impl Server {
    pub fn new(addr: String, state: AppState, tls: Option<TlsPaths>) -> Self {
        Self { addr, state, tls }
    }

    pub async fn run(&self) -> Result<(), Box<dyn Error + Send + Sync>> {
        let addr = self.addr
            .parse::<SocketAddr>()
            .map_err(|e| AppError::Config(format!("invalid listen address '{}': {}", self.addr, e)))?;
        let app = router(self.state.clone());

        match &self.tls {
            Some(tls) => {
                info!(
                    "TLS enabled. Loading certificate from '{}' and key from '{}'",
                    tls.cert_path,
                    tls.key_path
                );
                let tls_config = axum_server::tls_rustls::RustlsConfig::from_pem_file(
                    &tls.cert_path,
                    &tls.key_path
                ).await?;
                info!("Login API listening on https://{}", addr);
                axum_server::bind_rustls(addr, tls_config).serve(app.into_make_service()).await?;
            }
            None => {
                let listener = tokio::net::TcpListener::bind(addr).await.map_err(|e| {
                    error!("Failed to bind login API to {}: {}", addr, e);
                    e
                })?;
                info!("Login API listening on http://{}", addr);
                axum::serve(listener, app.into_make_service()).await?;
            }
        }

        Ok(())
    }
}
