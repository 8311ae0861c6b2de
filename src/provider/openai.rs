use async_trait::async_trait;
use futures::future::join_all;
use log::{ debug, info, warn };
use reqwest::{
    Client as HttpClient,
    RequestBuilder,
    Response,
    StatusCode,
    header::{ HeaderMap, HeaderValue, AUTHORIZATION },
    multipart::{ Form, Part },
};
use serde::{ de::DeserializeOwned, Deserialize, Serialize };
use url::Url;

use super::{ AssistantApi, ProviderConfig };
use crate::error::{ AppError, Result };
use crate::models::chat::{ Run, Thread, ThreadMessage };
use crate::models::files::StoredFile;

pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";
const BETA_HEADER: &str = "OpenAI-Beta";
const BETA_VALUE: &str = "assistants=v2";
const MESSAGE_PAGE_SIZE: u32 = 20;

pub struct OpenAIAssistantClient {
    http: HttpClient,
    base_url: String,
    vector_store_id: String,
}

#[derive(Serialize)]
struct CreateMessageRequest<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Serialize)]
struct CreateRunRequest<'a> {
    assistant_id: &'a str,
}

#[derive(Serialize)]
struct AttachFileRequest<'a> {
    file_id: &'a str,
}

#[derive(Deserialize)]
struct ListResponse<T> {
    data: Vec<T>,
}

#[derive(Deserialize)]
struct VectorStoreFile {
    id: String,
    #[serde(default)]
    created_at: i64,
}

#[derive(Deserialize)]
struct FileObject {
    id: String,
    filename: String,
    #[serde(default)]
    bytes: u64,
    #[serde(default)]
    created_at: i64,
}

#[derive(Deserialize)]
struct ErrorPayload {
    error: Option<ErrorFields>,
}

#[derive(Deserialize)]
struct ErrorFields {
    message: Option<String>,
}

impl OpenAIAssistantClient {
    pub fn new(
        api_key: String,
        base_url: Option<String>,
        vector_store_id: String
    ) -> Result<Self> {
        if api_key.trim().is_empty() {
            return Err(AppError::Auth("Falta la API key del proveedor".to_string()));
        }
        let base_url = base_url.unwrap_or_else(|| DEFAULT_BASE_URL.to_string());
        Url::parse(&base_url).map_err(|e|
            AppError::Config(format!("invalid provider base URL '{}': {}", base_url, e))
        )?;

        let mut headers = HeaderMap::new();
        headers.insert(
            AUTHORIZATION,
            HeaderValue::from_str(&format!("Bearer {}", api_key)).map_err(|e|
                AppError::Config(format!("Invalid API key format: {}", e))
            )?
        );
        headers.insert(BETA_HEADER, HeaderValue::from_static(BETA_VALUE));

        let http = HttpClient::builder()
            .default_headers(headers)
            .build()
            .map_err(|e| AppError::Config(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            vector_store_id,
        })
    }

    pub fn from_config(config: &ProviderConfig) -> Result<Self> {
        Self::new(config.api_key.clone(), config.base_url.clone(), config.vector_store_id.clone())
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn send<T: DeserializeOwned>(&self, req: RequestBuilder) -> Result<T> {
        let resp = req.send().await?;
        let resp = check_status(resp).await?;
        Ok(resp.json::<T>().await?)
    }

    async fn file_details(&self, file: &VectorStoreFile) -> StoredFile {
        let url = self.url(&format!("/files/{}", file.id));
        match self.send::<FileObject>(self.http.get(&url)).await {
            Ok(details) =>
                StoredFile {
                    id: file.id.clone(),
                    name: details.filename,
                    size: details.bytes,
                    created_at: details.created_at,
                },
            Err(e) => {
                warn!("Failed to fetch details for file {}: {}", file.id, e);
                StoredFile::placeholder(&file.id, file.created_at)
            }
        }
    }
}

/// Turns a non-2xx reply into an error carrying the provider's message.
async fn check_status(resp: Response) -> Result<Response> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }
    let body = resp.text().await.unwrap_or_default();
    let message = parse_error_message(status, &body);
    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
            Err(AppError::Auth(format!("API key inválida o ausente: {}", message)))
        }
        _ => Err(AppError::Status { status, message }),
    }
}

pub fn parse_error_message(status: StatusCode, body: &str) -> String {
    if let Ok(payload) = serde_json::from_str::<ErrorPayload>(body) {
        if let Some(message) = payload.error.and_then(|e| e.message).filter(|m| !m.is_empty()) {
            return message;
        }
    }
    if body.is_empty() {
        status.canonical_reason().unwrap_or("request failed").to_string()
    } else {
        body.to_string()
    }
}

#[async_trait]
impl AssistantApi for OpenAIAssistantClient {
    async fn create_thread(&self) -> Result<Thread> {
        let req = self.http.post(self.url("/threads")).json(&serde_json::json!({}));
        let thread: Thread = self.send(req).await?;
        info!("Created thread {}", thread.id);
        Ok(thread)
    }

    async fn add_message(&self, thread_id: &str, text: &str) -> Result<ThreadMessage> {
        let url = self.url(&format!("/threads/{}/messages", thread_id));
        let req = self.http.post(url).json(&(CreateMessageRequest { role: "user", content: text }));
        self.send(req).await
    }

    async fn create_run(&self, thread_id: &str, assistant_id: &str) -> Result<Run> {
        let url = self.url(&format!("/threads/{}/runs", thread_id));
        let req = self.http.post(url).json(&(CreateRunRequest { assistant_id }));
        let run: Run = self.send(req).await?;
        info!("Started run {} on thread {} ({})", run.id, thread_id, run.status);
        Ok(run)
    }

    async fn get_run(&self, thread_id: &str, run_id: &str) -> Result<Run> {
        let url = self.url(&format!("/threads/{}/runs/{}", thread_id, run_id));
        self.send(self.http.get(url)).await
    }

    async fn list_messages(&self, thread_id: &str) -> Result<Vec<ThreadMessage>> {
        let url = self.url(&format!("/threads/{}/messages", thread_id));
        let req = self.http.get(url).query(
            &[
                ("order", "desc".to_string()),
                ("limit", MESSAGE_PAGE_SIZE.to_string()),
            ]
        );
        let page: ListResponse<ThreadMessage> = self.send(req).await?;
        Ok(page.data)
    }

    async fn list_files(&self) -> Result<Vec<StoredFile>> {
        let url = self.url(&format!("/vector_stores/{}/files", self.vector_store_id));
        let page: ListResponse<VectorStoreFile> = self.send(self.http.get(url)).await?;
        debug!("Vector store {} lists {} files", self.vector_store_id, page.data.len());
        let files = join_all(page.data.iter().map(|f| self.file_details(f))).await;
        Ok(files)
    }

    async fn create_file(&self, name: &str, bytes: Vec<u8>) -> Result<StoredFile> {
        let size = bytes.len() as u64;
        let form = Form::new()
            .text("purpose", "assistants")
            .part("file", Part::bytes(bytes).file_name(name.to_string()));
        let uploaded: FileObject = self.send(
            self.http.post(self.url("/files")).multipart(form)
        ).await?;
        info!("Uploaded {} as {}", name, uploaded.id);

        let url = self.url(&format!("/vector_stores/{}/files", self.vector_store_id));
        let attached: VectorStoreFile = self.send(
            self.http.post(url).json(&(AttachFileRequest { file_id: &uploaded.id }))
        ).await?;

        Ok(StoredFile {
            id: attached.id,
            name: name.to_string(),
            size,
            created_at: attached.created_at,
        })
    }

    async fn delete_file(&self, file_id: &str) -> Result<()> {
        let url = self.url(&format!("/vector_stores/{}/files/{}", self.vector_store_id, file_id));
        let resp = self.http.delete(url).send().await?;
        check_status(resp).await?;
        info!("Removed {} from vector store {}", file_id, self.vector_store_id);
        Ok(())
    }
}
