pub mod client;
pub mod password;
pub mod service;
pub mod store;
pub mod token;

pub use self::client::AuthClient;
pub use self::service::AuthService;
pub use self::store::{ CredentialStore, MemoryCredentialStore, MySqlCredentialStore, User };
pub use self::token::TokenSigner;
