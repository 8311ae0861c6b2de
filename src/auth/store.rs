use async_trait::async_trait;
use log::{ error, info };
use sqlx::mysql::{ MySqlConnectOptions, MySqlPool, MySqlPoolOptions };
use std::collections::HashMap;

use crate::error::Result;

/// A row of the `users` table.
#[derive(Clone, Debug, PartialEq)]
pub struct User {
    pub id: i64,
    pub username: String,
    pub password_hash: String,
}

#[async_trait]
pub trait CredentialStore: Send + Sync {
    async fn find_by_username(&self, username: &str) -> Result<Option<User>>;
}

#[derive(Debug, Clone)]
pub struct DbConfig {
    pub host: String,
    pub port: u16,
    pub user: String,
    pub password: String,
    pub database: String,
    pub max_connections: u32,
}

pub struct MySqlCredentialStore {
    pool: MySqlPool,
}

impl MySqlCredentialStore {
    /// Builds the pool without opening a connection; see [`check_connection`](Self::check_connection).
    pub fn connect_lazy(config: &DbConfig) -> Self {
        let options = MySqlConnectOptions::new()
            .host(&config.host)
            .port(config.port)
            .username(&config.user)
            .password(&config.password)
            .database(&config.database);
        let pool = MySqlPoolOptions::new()
            .max_connections(config.max_connections)
            .connect_lazy_with(options);
        Self { pool }
    }

    /// Opens one connection and logs the outcome. Failure is not fatal: the
    /// pool keeps retrying on later requests.
    pub async fn check_connection(&self) -> bool {
        match self.pool.acquire().await {
            Ok(_) => {
                info!("MySQL connection OK");
                true
            }
            Err(e) => {
                error!("Failed to connect to MySQL: {}", e);
                false
            }
        }
    }
}

#[async_trait]
impl CredentialStore for MySqlCredentialStore {
    async fn find_by_username(&self, username: &str) -> Result<Option<User>> {
        let row: Option<(i64, String, String)> = sqlx
            ::query_as(
                "SELECT CAST(id AS SIGNED), username, password FROM users WHERE username = ? LIMIT 1"
            )
            .bind(username)
            .fetch_optional(&self.pool).await?;

        Ok(
            row.map(|(id, username, password_hash)| User {
                id,
                username,
                password_hash,
            })
        )
    }
}

#[derive(Default)]
pub struct MemoryCredentialStore {
    users: HashMap<String, User>,
}

impl MemoryCredentialStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_user(mut self, id: i64, username: &str, password_hash: &str) -> Self {
        self.users.insert(username.to_string(), User {
            id,
            username: username.to_string(),
            password_hash: password_hash.to_string(),
        });
        self
    }
}

#[async_trait]
impl CredentialStore for MemoryCredentialStore {
    async fn find_by_username(&self, username: &str) -> Result<Option<User>> {
        Ok(self.users.get(username).cloned())
    }
}
