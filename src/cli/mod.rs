pub mod commands;

use clap::{ Args as ClapArgs, Parser, Subcommand, ValueEnum };
use std::path::PathBuf;
use std::time::Duration;

use crate::auth::store::DbConfig;
use crate::engine::PollPolicy;
use crate::provider::ProviderConfig;

#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Run the login API (POST /api/login).
    Serve(ServeArgs),

    /// Print a bcrypt hash to insert into the users table.
    HashPassword {
        /// Password to hash.
        #[arg(long, env = "HASH_PASSWORD")]
        password: String,
    },

    /// Log in against a running login API and print the session token.
    Login(LoginArgs),

    /// Manage the documents available to the assistant.
    Files {
        #[command(flatten)]
        provider: ProviderArgs,

        #[command(subcommand)]
        action: FilesCommand,
    },

    /// Interactive chat with the assistant.
    Chat(ChatArgs),
}

#[derive(Subcommand, Debug, Clone)]
pub enum FilesCommand {
    /// List documents, optionally filtered by name.
    List {
        /// Case-insensitive name filter.
        #[arg(long, short = 's', default_value = "")]
        search: String,
    },
    /// Upload a document and add it to the vector store.
    Upload {
        path: PathBuf,
    },
    /// Remove a document from the vector store.
    Delete {
        id: String,
    },
}

#[derive(ClapArgs, Debug, Clone)]
pub struct ServeArgs {
    /// Host address and port for the login API to listen on.
    #[arg(long, env = "SERVER_ADDR", default_value = "0.0.0.0:3000")]
    pub server_addr: String,

    #[arg(long, env = "DB_HOST", default_value = "localhost")]
    pub db_host: String,

    #[arg(long, env = "DB_PORT", default_value = "3306")]
    pub db_port: u16,

    #[arg(long, env = "DB_USER", default_value = "root")]
    pub db_user: String,

    #[arg(long, env = "DB_PASSWORD", default_value = "")]
    pub db_password: String,

    #[arg(long, env = "DB_NAME", default_value = "docs_assistant")]
    pub db_name: String,

    /// Maximum open connections in the MySQL pool.
    #[arg(long, env = "DB_MAX_CONNECTIONS", default_value = "10")]
    pub db_max_connections: u32,

    /// Secret used to sign session tokens (HS256).
    #[arg(long, env = "JWT_SECRET")]
    pub jwt_secret: String,

    /// Session token lifetime in seconds.
    #[arg(long, env = "TOKEN_TTL_SECS", default_value = "3600")]
    pub token_ttl_secs: i64,

    /// Login attempts accepted per second, across all clients.
    #[arg(long, env = "LOGIN_RATE_LIMIT", default_value = "10")]
    pub login_rate_limit: u32,

    /// Optional path to the TLS certificate file (PEM format). Requires --tls-key-path.
    #[arg(long, env = "TLS_CERT_PATH")]
    pub tls_cert_path: Option<String>,

    /// Optional path to the TLS private key file (PEM format). Requires --tls-cert-path.
    #[arg(long, env = "TLS_KEY_PATH")]
    pub tls_key_path: Option<String>,

    #[arg(long, env = "ENABLE_TLS", default_value = "false")]
    pub enable_tls: bool,
}

impl ServeArgs {
    pub fn db_config(&self) -> DbConfig {
        DbConfig {
            host: self.db_host.clone(),
            port: self.db_port,
            user: self.db_user.clone(),
            password: self.db_password.clone(),
            database: self.db_name.clone(),
            max_connections: self.db_max_connections,
        }
    }
}

#[derive(ClapArgs, Debug, Clone)]
pub struct LoginArgs {
    /// Base URL of the login API.
    #[arg(long, env = "AUTH_URL", default_value = "http://localhost:3000")]
    pub auth_url: String,

    #[arg(long, short = 'u', env = "LOGIN_USERNAME")]
    pub username: String,

    #[arg(long, short = 'p', env = "LOGIN_PASSWORD")]
    pub password: String,
}

#[derive(ClapArgs, Debug, Clone)]
pub struct ProviderArgs {
    /// API key for the assistant provider.
    #[arg(long, env = "OPENAI_API_KEY", default_value = "")]
    pub api_key: String,

    /// Base URL of the provider API. Defaults to https://api.openai.com/v1.
    #[arg(long, env = "OPENAI_BASE_URL")]
    pub base_url: Option<String>,

    /// Vector store holding the assistant's documents.
    #[arg(long, env = "VECTOR_STORE_ID", default_value = "")]
    pub vector_store_id: String,
}

impl ProviderArgs {
    pub fn provider_config(&self) -> ProviderConfig {
        ProviderConfig {
            api_key: self.api_key.clone(),
            base_url: self.base_url.clone(),
            vector_store_id: self.vector_store_id.clone(),
        }
    }
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChatBackend {
    /// Threads and runs on the provider's assistant API.
    Assistant,
    /// Single-shot question endpoint.
    Ask,
}

#[derive(ClapArgs, Debug, Clone)]
pub struct ChatArgs {
    #[command(flatten)]
    pub provider: ProviderArgs,

    #[arg(long, env = "CHAT_BACKEND", value_enum, default_value = "assistant")]
    pub backend: ChatBackend,

    /// Assistant that answers on each run.
    #[arg(long, env = "ASSISTANT_ID", default_value = "")]
    pub assistant_id: String,

    /// Number of run status checks before giving up.
    #[arg(long, env = "POLL_MAX_ATTEMPTS", default_value = "20")]
    pub poll_max_attempts: u32,

    /// Delay between run status checks, in milliseconds.
    #[arg(long, env = "POLL_DELAY_MS", default_value = "1000")]
    pub poll_delay_ms: u64,

    /// Base URL of the question endpoint (ask backend).
    #[arg(long, env = "CHAT_API_URL", default_value = "http://localhost:8080")]
    pub ask_url: String,

    /// API key sent as x-api-key (ask backend).
    #[arg(long, env = "CHAT_API_KEY", default_value = "")]
    pub ask_api_key: String,
}

impl ChatArgs {
    pub fn poll_policy(&self) -> PollPolicy {
        PollPolicy::new(self.poll_max_attempts, Duration::from_millis(self.poll_delay_ms))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn chat_defaults_match_poll_policy_defaults() {
        let args = Args::try_parse_from(["docs-assistant", "chat", "--assistant-id", "asst_1"]).unwrap();
        let Command::Chat(chat) = args.command else {
            panic!("expected chat command");
        };
        assert_eq!(chat.poll_policy(), PollPolicy::default());
        assert_eq!(chat.backend, ChatBackend::Assistant);
    }

    #[test]
    fn files_list_takes_search_term() {
        let args = Args::try_parse_from([
            "docs-assistant",
            "files",
            "--vector-store-id",
            "vs_1",
            "list",
            "--search",
            "informe",
        ]).unwrap();
        match args.command {
            Command::Files { provider, action: FilesCommand::List { search } } => {
                assert_eq!(provider.vector_store_id, "vs_1");
                assert_eq!(search, "informe");
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }
}
