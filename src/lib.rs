pub mod auth;
pub mod cli;
pub mod documents;
pub mod engine;
pub mod error;
pub mod models;
pub mod provider;
pub mod server;

use cli::{ commands, Args, Command };
use std::error::Error;

pub async fn run(args: Args) -> Result<(), Box<dyn Error + Send + Sync>> {
    match args.command {
        Command::Serve(serve) => commands::serve(serve).await,
        Command::HashPassword { password } => commands::hash_password(&password),
        Command::Login(login) => commands::login(login).await,
        Command::Files { provider, action } => commands::files(provider, action).await,
        Command::Chat(chat) => commands::chat(chat).await,
    }
}
