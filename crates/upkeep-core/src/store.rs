use crate::{DueTask, MaintenanceEvent, MaintenanceTask, NotificationLogEntry, Result};
use async_trait::async_trait;
use std::path::PathBuf;

/// Read/append access to the maintenance tables.
#[async_trait]
pub trait MaintenanceStore: Send + Sync {
    /// Active tasks due within `within_days`, ordered by due date then title.
    async fn list_due(&self, within_days: u32) -> Result<Vec<DueTask>>;

    /// Raw email(s) of the task's responsible operator.
    async fn recipients_for_task(&self, task_id: i64) -> Result<Vec<String>>;

    async fn was_recently_notified(
        &self,
        task_id: i64,
        email: &str,
        throttle_days: u32,
    ) -> Result<bool>;

    /// Returns affected rows.
    async fn log_notification(&self, entry: &NotificationLogEntry) -> Result<u64>;

    /// Returns affected rows. `done_at` is stamped by the store.
    async fn insert_event(
        &self,
        task_id: i64,
        done_by_operator_id: Option<i64>,
        notes: Option<&str>,
    ) -> Result<u64>;

    /// Event history, newest first.
    async fn list_events(&self, task_id: i64) -> Result<Vec<MaintenanceEvent>>;

    async fn get_task(&self, task_id: i64) -> Result<Option<MaintenanceTask>>;
}

/// A multipart (plain + HTML) message with optional attachments.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct OutgoingEmail {
    pub subject: String,
    pub html: String,
    pub text: Option<String>,
    pub to: Vec<String>,
    pub cc: Vec<String>,
    pub bcc: Vec<String>,
    pub reply_to: Option<String>,
    pub attachments: Vec<PathBuf>,
}

impl OutgoingEmail {
    pub fn new(subject: impl Into<String>, html: impl Into<String>, to: Vec<String>) -> Self {
        Self {
            subject: subject.into(),
            html: html.into(),
            to,
            ..Default::default()
        }
    }

    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = Some(text.into());
        self
    }

    pub fn with_cc(mut self, cc: Vec<String>) -> Self {
        self.cc = cc;
        self
    }

    pub fn with_bcc(mut self, bcc: Vec<String>) -> Self {
        self.bcc = bcc;
        self
    }
}

#[async_trait]
pub trait Mailer: Send + Sync {
    /// Deliver the message and return the number of envelope recipients.
    async fn send(&self, email: &OutgoingEmail) -> Result<usize>;
}

/// One database session that executes raw statements in order.
#[async_trait]
pub trait ScriptSession: Send {
    /// Returns affected rows.
    async fn execute(&mut self, sql: &str) -> Result<u64>;
}

#[async_trait]
pub trait SessionProvider: Send + Sync {
    async fn open_session(&self) -> Result<Box<dyn ScriptSession>>;
}
