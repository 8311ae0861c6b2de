pub mod ask;
pub mod memory;
pub mod openai;

use async_trait::async_trait;
use std::sync::Arc;

use crate::error::Result;
use crate::models::chat::{ Run, Thread, ThreadMessage };
use crate::models::files::StoredFile;
use self::openai::OpenAIAssistantClient;

/// The remote assistant service: threads, runs and the document store
/// backing the assistant's file search.
#[async_trait]
pub trait AssistantApi: Send + Sync {
    async fn create_thread(&self) -> Result<Thread>;

    async fn add_message(&self, thread_id: &str, text: &str) -> Result<ThreadMessage>;

    async fn create_run(&self, thread_id: &str, assistant_id: &str) -> Result<Run>;

    async fn get_run(&self, thread_id: &str, run_id: &str) -> Result<Run>;

    /// Messages of a thread, newest first.
    async fn list_messages(&self, thread_id: &str) -> Result<Vec<ThreadMessage>>;

    async fn list_files(&self) -> Result<Vec<StoredFile>>;

    async fn create_file(&self, name: &str, bytes: Vec<u8>) -> Result<StoredFile>;

    async fn delete_file(&self, file_id: &str) -> Result<()>;
}

#[derive(Debug, Clone)]
pub struct ProviderConfig {
    pub api_key: String,
    pub base_url: Option<String>,
    pub vector_store_id: String,
}

pub fn new_client(config: &ProviderConfig) -> Result<Arc<dyn AssistantApi>> {
    let client = OpenAIAssistantClient::from_config(config)?;
    Ok(Arc::new(client))
}
