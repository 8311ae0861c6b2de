pub mod poll;

use chrono::Utc;
use log::{ debug, info, warn };
use std::sync::Arc;
use uuid::Uuid;

use crate::error::{ AppError, Result };
use crate::models::chat::{ ChatMessage, Role, RunId, ThreadId };
use crate::provider::AssistantApi;
pub use self::poll::PollPolicy;

/// Shown when a completed run left no assistant message to display.
pub const FALLBACK_REPLY: &str = "Lo siento, no pude obtener una respuesta del asistente.";
pub const GREETING: &str = "¡Hola! Soy tu asistente virtual. ¿En qué puedo ayudarte hoy?";

/// Drives one chat session: a single remote thread, runs started on it one at
/// a time, and the transcript of what was said.
pub struct ConversationEngine {
    api: Arc<dyn AssistantApi>,
    assistant_id: String,
    policy: PollPolicy,
    thread_id: Option<ThreadId>,
    transcript: Vec<ChatMessage>,
}

impl ConversationEngine {
    pub fn new(api: Arc<dyn AssistantApi>, assistant_id: impl Into<String>, policy: PollPolicy) -> Self {
        Self {
            api,
            assistant_id: assistant_id.into(),
            policy,
            thread_id: None,
            transcript: Vec::new(),
        }
    }

    pub fn thread_id(&self) -> Option<&str> {
        self.thread_id.as_deref()
    }

    pub fn transcript(&self) -> &[ChatMessage] {
        &self.transcript
    }

    pub fn policy(&self) -> PollPolicy {
        self.policy
    }

    /// Opens the session's thread. May be called again after a failure.
    pub async fn create_thread(&mut self) -> Result<ThreadId> {
        match self.api.create_thread().await {
            Ok(thread) => {
                info!("Chat session started on thread {}", thread.id);
                self.thread_id = Some(thread.id.clone());
                Ok(thread.id)
            }
            Err(e) => {
                warn!("Thread creation failed: {}", e);
                self.thread_id = None;
                Err(AppError::Initialization(e.to_string()))
            }
        }
    }

    /// Posts `text` as a user message and starts a run over the thread.
    ///
    /// Returns `Ok(None)` without touching the network when the thread id is
    /// empty or the text is blank.
    pub async fn submit_message(&self, thread_id: &str, text: &str) -> Result<Option<RunId>> {
        let text = text.trim();
        if thread_id.is_empty() || text.is_empty() {
            debug!("Ignoring submission (thread id or text empty)");
            return Ok(None);
        }
        self.api.add_message(thread_id, text).await?;
        let run = self.api.create_run(thread_id, &self.assistant_id).await?;
        Ok(Some(run.id))
    }

    /// Polls the run until it reaches a terminal status or the attempt budget
    /// runs out, then returns the assistant's reply.
    pub async fn await_run_completion(&self, thread_id: &str, run_id: &str) -> Result<String> {
        let max_attempts = self.policy.max_attempts;
        for attempt in 1..=max_attempts {
            let run = self.api.get_run(thread_id, run_id).await?;
            if run.status.is_failure() {
                if let Some(err) = &run.last_error {
                    warn!("Run {} ended as {}: {} {}", run_id, run.status, err.code, err.message);
                } else {
                    warn!("Run {} ended as {}", run_id, run.status);
                }
                return Err(AppError::RunFailed(run.status));
            }
            if run.status.is_terminal() {
                debug!("Run {} completed after {} checks", run_id, attempt);
                return self.extract_reply(thread_id).await;
            }
            debug!("Run {} is {} ({}/{})", run_id, run.status, attempt, max_attempts);
            if attempt < max_attempts && !self.policy.delay.is_zero() {
                tokio::time::sleep(self.policy.delay).await;
            }
        }
        warn!("Run {} still unfinished after {} checks", run_id, max_attempts);
        Err(AppError::RunTimeout { attempts: max_attempts })
    }

    /// Text of the newest assistant message, or [`FALLBACK_REPLY`].
    pub async fn extract_reply(&self, thread_id: &str) -> Result<String> {
        let messages = self.api.list_messages(thread_id).await?;
        let reply = messages
            .iter()
            .find(|m| m.role == Role::Assistant)
            .map(|m| m.text())
            .filter(|text| !text.trim().is_empty());
        match reply {
            Some(text) => Ok(text),
            None => {
                warn!("No assistant message on thread {}", thread_id);
                Ok(FALLBACK_REPLY.to_string())
            }
        }
    }

    /// Full round trip for one user utterance. The user entry is added to the
    /// transcript before any remote call; the assistant entry only on success.
    pub async fn send(&mut self, text: &str) -> Result<Option<ChatMessage>> {
        let text = text.trim();
        let thread_id = match self.thread_id.clone() {
            Some(id) if !text.is_empty() => id,
            Some(_) => {
                return Ok(None);
            }
            None => {
                warn!("Message dropped: no thread for this session");
                return Ok(None);
            }
        };

        self.transcript.push(local_message(Role::User, text));

        let Some(run_id) = self.submit_message(&thread_id, text).await? else {
            return Ok(None);
        };
        let reply = self.await_run_completion(&thread_id, &run_id).await?;
        let message = local_message(Role::Assistant, &reply);
        self.transcript.push(message.clone());
        Ok(Some(message))
    }
}

fn local_message(role: Role, text: &str) -> ChatMessage {
    ChatMessage {
        id: Uuid::new_v4().to_string(),
        role,
        text: text.to_string(),
        created_at: Utc::now().timestamp(),
    }
}
