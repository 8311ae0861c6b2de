use log::{ info, warn };
use std::error::Error;
use std::sync::Arc;
use tokio::io::{ AsyncBufReadExt, BufReader };

use super::{ ChatArgs, ChatBackend, FilesCommand, LoginArgs, ProviderArgs, ServeArgs };
use crate::auth::{ password, AuthClient, AuthService, MySqlCredentialStore, TokenSigner };
use crate::documents::{ self, DocumentStore };
use crate::engine::{ ConversationEngine, GREETING };
use crate::error::AppError;
use crate::models::files::StoredFile;
use crate::provider::{ self, ask::AskClient };
use crate::server::{ AppState, Server, TlsPaths };

type CmdResult = Result<(), Box<dyn Error + Send + Sync>>;

const EXIT_COMMANDS: [&str; 3] = ["/salir", "/exit", "/quit"];

pub async fn serve(args: ServeArgs) -> CmdResult {
    info!("--- Login API Configuration ---");
    info!("Server Address: {}", args.server_addr);
    info!("Database: {}@{}:{}/{}", args.db_user, args.db_host, args.db_port, args.db_name);
    info!("Token TTL: {}s", args.token_ttl_secs);
    info!("Login Rate Limit: {}/s", args.login_rate_limit);
    info!("TLS Enabled: {}", args.enable_tls);
    info!("-------------------------------");

    let tls = if args.enable_tls {
        match (&args.tls_cert_path, &args.tls_key_path) {
            (Some(cert_path), Some(key_path)) =>
                Some(TlsPaths { cert_path: cert_path.clone(), key_path: key_path.clone() }),
            _ => {
                return Err(
                    AppError::Config(
                        "Both --tls-cert-path and --tls-key-path must be provided to enable TLS.".into()
                    ).into()
                );
            }
        }
    } else {
        None
    };

    let store = MySqlCredentialStore::connect_lazy(&args.db_config());
    store.check_connection().await;

    let signer = TokenSigner::new(&args.jwt_secret, args.token_ttl_secs)?;
    let auth = Arc::new(AuthService::new(Arc::new(store), signer));
    let state = AppState::new(auth, args.login_rate_limit)?;

    Server::new(args.server_addr, state, tls).run().await
}

pub fn hash_password(password: &str) -> CmdResult {
    let hash = password::hash_password(password)?;
    println!("{}", hash_report(&hash));
    Ok(())
}

fn hash_report(hash: &str) -> String {
    format!("Contraseña cifrada: {}\nInserta este hash en la tabla users.", hash)
}

pub async fn login(args: LoginArgs) -> CmdResult {
    let mut client = AuthClient::new(&args.auth_url);
    match client.login(&args.username, &args.password).await {
        Ok(session) => {
            println!("Bienvenido, {}", session.username);
            println!("{}", session.token);
            Ok(())
        }
        Err(e) => {
            eprintln!("{}", e.user_message());
            Err(e.into())
        }
    }
}

pub async fn files(provider_args: ProviderArgs, action: FilesCommand) -> CmdResult {
    if provider_args.vector_store_id.is_empty() {
        return Err(AppError::Config("VECTOR_STORE_ID is required".into()).into());
    }
    let api = provider::new_client(&provider_args.provider_config())?;
    let store = DocumentStore::new(api);

    let result = match action {
        FilesCommand::List { search } => {
            store.list().await.map(|files| {
                let shown = documents::search(&files, &search);
                print_files(&shown);
            })
        }
        FilesCommand::Upload { path } => {
            store.upload(&path).await.map(|file| {
                println!("Subido: {} ({} bytes) -> {}", file.name, file.size, file.id);
            })
        }
        FilesCommand::Delete { id } => {
            store.delete(&id).await.map(|()| println!("Eliminado: {}", id))
        }
    };

    result.map_err(|e| {
        eprintln!("{}", e.user_message());
        e.into()
    })
}

fn print_files(files: &[&StoredFile]) {
    print!("{}", files_table(files));
}

fn files_table(files: &[&StoredFile]) -> String {
    let mut table = format!("{:<32} {:<40} {:>14}\n", "ID", "Nombre", "Tamaño");
    for file in files {
        let size = format!("{} bytes", file.size);
        table.push_str(&format!("{:<32} {:<40} {:>14}\n", file.id, file.name, size));
    }
    table
}

pub async fn chat(args: ChatArgs) -> CmdResult {
    match args.backend {
        ChatBackend::Assistant => chat_with_assistant(args).await,
        ChatBackend::Ask => chat_with_ask(args).await,
    }
}

async fn chat_with_assistant(args: ChatArgs) -> CmdResult {
    if args.assistant_id.is_empty() {
        return Err(AppError::Config("ASSISTANT_ID is required".into()).into());
    }
    let api = provider::new_client(&args.provider.provider_config())?;
    let mut engine = ConversationEngine::new(api, args.assistant_id.clone(), args.poll_policy());

    if let Err(e) = engine.create_thread().await {
        eprintln!("[error] {}", e.user_message());
    }
    println!("asistente> {}", GREETING);

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        let input = line.trim();
        if EXIT_COMMANDS.contains(&input) {
            break;
        }
        if input.is_empty() {
            continue;
        }
        if engine.thread_id().is_none() {
            if let Err(e) = engine.create_thread().await {
                eprintln!("[error] {}", e.user_message());
                continue;
            }
        }
        match engine.send(input).await {
            Ok(Some(reply)) => println!("asistente> {}", reply.text),
            Ok(None) => {}
            Err(e) => {
                warn!("Chat error: {}", e);
                eprintln!("[error] {}", e.user_message());
            }
        }
    }
    Ok(())
}

async fn chat_with_ask(args: ChatArgs) -> CmdResult {
    let client = AskClient::new(args.ask_url.clone(), args.ask_api_key.clone());
    println!("asistente> {}", GREETING);

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        let input = line.trim();
        if EXIT_COMMANDS.contains(&input) {
            break;
        }
        if input.is_empty() {
            continue;
        }
        match client.ask(input).await {
            Ok(answer) => println!("asistente> {}", answer),
            Err(e) => {
                warn!("Chat error: {}", e);
                eprintln!("[error] {}", e.user_message());
            }
        }
    }
    Ok(())
}
