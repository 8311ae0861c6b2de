//! In-process implementation of [`AssistantApi`].
//!
//! Runs follow a scripted status sequence and complete with scripted replies,
//! which makes the run lifecycle reproducible without network access. Every
//! call is counted so callers can check which remote operations happened.

use async_trait::async_trait;
use chrono::Utc;
use reqwest::StatusCode;
use std::collections::{ HashMap, VecDeque };
use std::sync::{ Mutex, MutexGuard };

use super::AssistantApi;
use crate::error::{ AppError, Result };
use crate::models::chat::{ MessageContent, Role, Run, RunStatus, Thread, ThreadMessage };
use crate::models::files::StoredFile;

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CallCounts {
    pub create_thread: usize,
    pub add_message: usize,
    pub create_run: usize,
    pub get_run: usize,
    pub list_messages: usize,
    pub list_files: usize,
    pub create_file: usize,
    pub delete_file: usize,
}

impl CallCounts {
    pub fn total(&self) -> usize {
        self.create_thread +
            self.add_message +
            self.create_run +
            self.get_run +
            self.list_messages +
            self.list_files +
            self.create_file +
            self.delete_file
    }
}

struct ScriptedRun {
    thread_id: String,
    pending: VecDeque<RunStatus>,
    current: RunStatus,
    replied: bool,
}

#[derive(Default)]
struct State {
    next_id: u64,
    threads: HashMap<String, Vec<ThreadMessage>>,
    runs: HashMap<String, ScriptedRun>,
    run_script: Vec<RunStatus>,
    replies: VecDeque<Vec<MessageContent>>,
    files: Vec<StoredFile>,
    fail_thread_creation: bool,
    oldest_first: bool,
    calls: CallCounts,
}

impl State {
    fn next_id(&mut self, prefix: &str) -> String {
        self.next_id += 1;
        format!("{}_{}", prefix, self.next_id)
    }
}

pub struct MemoryAssistantApi {
    state: Mutex<State>,
}

impl Default for MemoryAssistantApi {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryAssistantApi {
    /// Runs complete on the first status check and produce no reply unless
    /// one is scripted with [`with_reply`](Self::with_reply).
    pub fn new() -> Self {
        Self {
            state: Mutex::new(State {
                run_script: vec![RunStatus::Completed],
                ..State::default()
            }),
        }
    }

    /// Statuses returned by successive `get_run` calls of every new run. The
    /// last status repeats once the script is used up.
    pub fn with_run_statuses<I, S>(self, statuses: I) -> Self
        where I: IntoIterator<Item = S>, S: Into<RunStatus>
    {
        if let Ok(mut state) = self.state.lock() {
            state.run_script = statuses.into_iter().map(Into::into).collect();
        }
        self
    }

    /// Queues the assistant message posted when the next run completes.
    pub fn with_reply(self, text: &str) -> Self {
        self.with_reply_parts(vec![MessageContent::text(text)])
    }

    pub fn with_reply_parts(self, parts: Vec<MessageContent>) -> Self {
        if let Ok(mut state) = self.state.lock() {
            state.replies.push_back(parts);
        }
        self
    }

    pub fn with_files(self, files: Vec<StoredFile>) -> Self {
        if let Ok(mut state) = self.state.lock() {
            state.files = files;
        }
        self
    }

    pub fn failing_thread_creation(self) -> Self {
        if let Ok(mut state) = self.state.lock() {
            state.fail_thread_creation = true;
        }
        self
    }

    /// Lists thread messages oldest first instead of newest first.
    pub fn listing_oldest_first(self) -> Self {
        if let Ok(mut state) = self.state.lock() {
            state.oldest_first = true;
        }
        self
    }

    pub fn set_fail_thread_creation(&self, fail: bool) -> Result<()> {
        self.state()?.fail_thread_creation = fail;
        Ok(())
    }

    pub fn calls(&self) -> CallCounts {
        self.state.lock().map(|s| s.calls.clone()).unwrap_or_default()
    }

    /// Messages of a thread in insertion order.
    pub fn thread_messages(&self, thread_id: &str) -> Vec<ThreadMessage> {
        self.state
            .lock()
            .ok()
            .and_then(|s| s.threads.get(thread_id).cloned())
            .unwrap_or_default()
    }

    fn state(&self) -> Result<MutexGuard<'_, State>> {
        self.state.lock().map_err(|_| AppError::Internal("memory provider state poisoned".into()))
    }
}

fn not_found(what: &str, id: &str) -> AppError {
    AppError::Status {
        status: StatusCode::NOT_FOUND,
        message: format!("No {} found with id '{}'.", what, id),
    }
}

#[async_trait]
impl AssistantApi for MemoryAssistantApi {
    async fn create_thread(&self) -> Result<Thread> {
        let mut state = self.state()?;
        state.calls.create_thread += 1;
        if state.fail_thread_creation {
            return Err(AppError::Network("connection refused".into()));
        }
        let id = state.next_id("thread");
        state.threads.insert(id.clone(), Vec::new());
        Ok(Thread { id, created_at: Utc::now().timestamp() })
    }

    async fn add_message(&self, thread_id: &str, text: &str) -> Result<ThreadMessage> {
        let mut state = self.state()?;
        state.calls.add_message += 1;
        if !state.threads.contains_key(thread_id) {
            return Err(not_found("thread", thread_id));
        }
        let message = ThreadMessage {
            id: state.next_id("msg"),
            role: Role::User,
            content: vec![MessageContent::text(text)],
            created_at: Utc::now().timestamp(),
        };
        if let Some(messages) = state.threads.get_mut(thread_id) {
            messages.push(message.clone());
        }
        Ok(message)
    }

    async fn create_run(&self, thread_id: &str, assistant_id: &str) -> Result<Run> {
        let mut state = self.state()?;
        state.calls.create_run += 1;
        if !state.threads.contains_key(thread_id) {
            return Err(not_found("thread", thread_id));
        }
        let id = state.next_id("run");
        let pending: VecDeque<RunStatus> = state.run_script.iter().cloned().collect();
        state.runs.insert(id.clone(), ScriptedRun {
            thread_id: thread_id.to_string(),
            pending,
            current: RunStatus::Queued,
            replied: false,
        });
        Ok(Run {
            id,
            thread_id: thread_id.to_string(),
            assistant_id: assistant_id.to_string(),
            status: RunStatus::Queued,
            last_error: None,
        })
    }

    async fn get_run(&self, thread_id: &str, run_id: &str) -> Result<Run> {
        let mut guard = self.state()?;
        let state = &mut *guard;
        state.calls.get_run += 1;
        let run = match state.runs.get_mut(run_id) {
            Some(run) if run.thread_id == thread_id => run,
            _ => {
                return Err(not_found("run", run_id));
            }
        };
        if let Some(next) = run.pending.pop_front() {
            run.current = next;
        }
        let status = run.current.clone();

        if status == RunStatus::Completed && !run.replied {
            run.replied = true;
            if let Some(parts) = state.replies.pop_front() {
                state.next_id += 1;
                let reply = ThreadMessage {
                    id: format!("msg_{}", state.next_id),
                    role: Role::Assistant,
                    content: parts,
                    created_at: Utc::now().timestamp(),
                };
                state.threads.entry(thread_id.to_string()).or_default().push(reply);
            }
        }

        Ok(Run {
            id: run_id.to_string(),
            thread_id: thread_id.to_string(),
            assistant_id: String::new(),
            status,
            last_error: None,
        })
    }

    async fn list_messages(&self, thread_id: &str) -> Result<Vec<ThreadMessage>> {
        let mut state = self.state()?;
        state.calls.list_messages += 1;
        let mut messages = state.threads
            .get(thread_id)
            .cloned()
            .ok_or_else(|| not_found("thread", thread_id))?;
        if !state.oldest_first {
            messages.reverse();
        }
        Ok(messages)
    }

    async fn list_files(&self) -> Result<Vec<StoredFile>> {
        let mut state = self.state()?;
        state.calls.list_files += 1;
        Ok(state.files.clone())
    }

    async fn create_file(&self, name: &str, bytes: Vec<u8>) -> Result<StoredFile> {
        let mut state = self.state()?;
        state.calls.create_file += 1;
        let file = StoredFile {
            id: state.next_id("file"),
            name: name.to_string(),
            size: bytes.len() as u64,
            created_at: Utc::now().timestamp(),
        };
        state.files.push(file.clone());
        Ok(file)
    }

    async fn delete_file(&self, file_id: &str) -> Result<()> {
        let mut state = self.state()?;
        state.calls.delete_file += 1;
        let before = state.files.len();
        state.files.retain(|f| f.id != file_id);
        if state.files.len() == before {
            return Err(not_found("file", file_id));
        }
        Ok(())
    }
}
