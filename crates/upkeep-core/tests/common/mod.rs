#![allow(dead_code)]

use async_trait::async_trait;
use chrono::{NaiveDate, Utc};
use std::collections::{HashMap, HashSet};
use std::sync::Mutex;
use upkeep_core::{
    throttle, DueTask, Error, Mailer, MaintenanceEvent, MaintenanceStore, MaintenanceTask,
    NotificationLogEntry, OutgoingEmail, Result, ScriptSession, SessionProvider,
};

pub fn due(task_id: i64, title: &str, day: u32) -> DueTask {
    DueTask {
        task_id,
        title: title.to_string(),
        next_due_at: NaiveDate::from_ymd_opt(2025, 6, day)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap(),
        department_name: None,
        area_label: Some("Workshop".to_string()),
    }
}

#[derive(Default)]
pub struct FakeStore {
    pub due: Vec<DueTask>,
    pub recipients: HashMap<i64, Vec<String>>,
    pub tasks: Vec<MaintenanceTask>,
    pub log: Mutex<Vec<NotificationLogEntry>>,
    pub events: Mutex<Vec<MaintenanceEvent>>,
    pub fail_queries: bool,
    pub fail_log_writes: bool,
    pub fail_event_writes: bool,
}

impl FakeStore {
    pub fn with_due(due: Vec<DueTask>) -> Self {
        Self {
            due,
            ..Default::default()
        }
    }

    pub fn recipient(mut self, task_id: i64, email: &str) -> Self {
        self.recipients
            .entry(task_id)
            .or_default()
            .push(email.to_string());
        self
    }

    /// Pretend `email` was notified about `task_id` `days_ago` days ago.
    pub fn logged(self, task_id: i64, email: &str, days_ago: i64) -> Self {
        let sent_at = Utc::now().naive_utc() - chrono::Duration::days(days_ago);
        self.log.lock().unwrap().push(NotificationLogEntry {
            task_id,
            recipient_email: email.to_string(),
            subject: "earlier".to_string(),
            reason: NotificationLogEntry::REASON_DUE_TIME.to_string(),
            sent_at: Some(sent_at),
        });
        self
    }

    pub fn log_entries(&self) -> Vec<NotificationLogEntry> {
        self.log.lock().unwrap().clone()
    }

    pub fn new_log_entries(&self) -> Vec<(i64, String)> {
        self.log
            .lock()
            .unwrap()
            .iter()
            .filter(|e| e.subject != "earlier")
            .map(|e| (e.task_id, e.recipient_email.clone()))
            .collect()
    }

    pub fn event_list(&self) -> Vec<MaintenanceEvent> {
        self.events.lock().unwrap().clone()
    }
}

#[async_trait]
impl MaintenanceStore for FakeStore {
    async fn list_due(&self, _within_days: u32) -> Result<Vec<DueTask>> {
        if self.fail_queries {
            return Err(Error::Store("connection refused".to_string()));
        }
        Ok(self.due.clone())
    }

    async fn recipients_for_task(&self, task_id: i64) -> Result<Vec<String>> {
        Ok(self.recipients.get(&task_id).cloned().unwrap_or_default())
    }

    async fn was_recently_notified(
        &self,
        task_id: i64,
        email: &str,
        throttle_days: u32,
    ) -> Result<bool> {
        let now = Utc::now().naive_utc();
        Ok(self.log.lock().unwrap().iter().any(|e| {
            e.task_id == task_id
                && e.recipient_email == email
                && e
                    .sent_at
                    .map(|at| throttle::within_cooldown(at, now, throttle_days))
                    .unwrap_or(false)
        }))
    }

    async fn log_notification(&self, entry: &NotificationLogEntry) -> Result<u64> {
        if self.fail_log_writes {
            return Err(Error::Store("log table locked".to_string()));
        }
        let mut entry = entry.clone();
        entry.sent_at = Some(Utc::now().naive_utc());
        self.log.lock().unwrap().push(entry);
        Ok(1)
    }

    async fn insert_event(
        &self,
        task_id: i64,
        done_by_operator_id: Option<i64>,
        notes: Option<&str>,
    ) -> Result<u64> {
        if self.fail_event_writes {
            return Err(Error::Store("event table locked".to_string()));
        }
        let mut events = self.events.lock().unwrap();
        let id = events.len() as i64 + 1;
        events.push(MaintenanceEvent {
            id,
            task_id,
            done_at: Utc::now().naive_utc(),
            done_by_operator_id,
            operator_first_name: None,
            operator_last_name: None,
            notes: notes.map(str::to_string),
        });
        Ok(1)
    }

    async fn list_events(&self, task_id: i64) -> Result<Vec<MaintenanceEvent>> {
        let mut events: Vec<_> = self
            .event_list()
            .into_iter()
            .filter(|e| e.task_id == task_id)
            .collect();
        events.sort_by(|a, b| b.done_at.cmp(&a.done_at));
        Ok(events)
    }

    async fn get_task(&self, task_id: i64) -> Result<Option<MaintenanceTask>> {
        Ok(self.tasks.iter().find(|t| t.id == task_id).cloned())
    }
}

#[derive(Default)]
pub struct FakeMailer {
    pub sent: Mutex<Vec<OutgoingEmail>>,
    /// Lower-cased addresses whose delivery fails.
    pub failing: HashSet<String>,
}

impl FakeMailer {
    pub fn failing_for(addresses: &[&str]) -> Self {
        Self {
            failing: addresses.iter().map(|a| a.to_lowercase()).collect(),
            ..Default::default()
        }
    }

    pub fn sent(&self) -> Vec<OutgoingEmail> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait]
impl Mailer for FakeMailer {
    async fn send(&self, email: &OutgoingEmail) -> Result<usize> {
        let all: Vec<&String> = email.to.iter().chain(&email.cc).chain(&email.bcc).collect();
        if all.is_empty() {
            return Err(Error::Transport("no recipients".to_string()));
        }
        if all.iter().any(|a| self.failing.contains(&a.to_lowercase())) {
            return Err(Error::Transport("550 mailbox unavailable".to_string()));
        }
        self.sent.lock().unwrap().push(email.clone());
        Ok(all.len())
    }
}

/// Records executed statements; fails on the statement at `fail_at` (1-based).
#[derive(Default)]
pub struct FakeSessions {
    pub executed: std::sync::Arc<Mutex<Vec<String>>>,
    pub opened: Mutex<usize>,
    pub fail_at: Option<usize>,
}

struct FakeSession {
    executed: std::sync::Arc<Mutex<Vec<String>>>,
    seen: usize,
    fail_at: Option<usize>,
}

#[async_trait]
impl ScriptSession for FakeSession {
    async fn execute(&mut self, sql: &str) -> Result<u64> {
        self.seen += 1;
        if Some(self.seen) == self.fail_at {
            return Err(Error::Store(format!("syntax error near '{}'", sql)));
        }
        self.executed.lock().unwrap().push(sql.to_string());
        Ok(0)
    }
}

#[async_trait]
impl SessionProvider for FakeSessions {
    async fn open_session(&self) -> Result<Box<dyn ScriptSession>> {
        *self.opened.lock().unwrap() += 1;
        Ok(Box::new(FakeSession {
            executed: self.executed.clone(),
            seen: 0,
            fail_at: self.fail_at,
        }))
    }
}
