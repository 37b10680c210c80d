use crate::config::RecipientMode;
use crate::{
    recipients, render, DueTask, Mailer, MaintenanceStore, NotificationLogEntry, OutgoingEmail,
    Result, StaticRecipients,
};
use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use serde::Serialize;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NotifyOptions {
    pub within_days: u32,
    pub throttle_days: u32,
    pub dry_run: bool,
    /// Insert an AUTO_RESET event per notified task so its next due date advances.
    pub advance_on_send: bool,
}

impl Default for NotifyOptions {
    fn default() -> Self {
        Self {
            within_days: 7,
            throttle_days: 7,
            dry_run: false,
            advance_on_send: true,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SendSummary {
    pub rows_found: usize,
    pub distinct_recipients: usize,
    pub sent: usize,
    pub skipped: usize,
}

/// Due tasks collected for one recipient.
#[derive(Debug)]
struct RecipientBatch {
    email: String,
    rows: Vec<DueTask>,
    /// Address each row was throttle-checked under, parallel to `rows`.
    /// Logging under the same spelling keeps the next check matching.
    checked_as: Vec<String>,
}

/// Tasks already advanced during this run.
#[derive(Default)]
struct AdvanceTracker {
    advanced: HashSet<i64>,
}

impl AdvanceTracker {
    /// Best effort: a failed insert is logged and the task stays eligible.
    async fn advance(&mut self, store: &dyn MaintenanceStore, task_id: i64, notes: String) {
        if self.advanced.contains(&task_id) {
            return;
        }

        match store.insert_event(task_id, None, Some(&notes)).await {
            Ok(_) => {
                tracing::debug!("Advanced task {}: {}", task_id, notes);
                self.advanced.insert(task_id);
            }
            Err(e) => {
                tracing::warn!("Failed to insert AUTO_RESET event for task {}: {}", task_id, e);
            }
        }
    }
}

/// Due/notify/throttle/advance workflow.
pub struct MaintenanceNotifier {
    store: Arc<dyn MaintenanceStore>,
    mailer: Arc<dyn Mailer>,
    recipient_mode: RecipientMode,
    timezone: Tz,
}

impl MaintenanceNotifier {
    pub fn new(
        store: Arc<dyn MaintenanceStore>,
        mailer: Arc<dyn Mailer>,
        recipient_mode: RecipientMode,
        timezone: Tz,
    ) -> Self {
        Self {
            store,
            mailer,
            recipient_mode,
            timezone,
        }
    }

    fn now(&self) -> DateTime<Tz> {
        Utc::now().with_timezone(&self.timezone)
    }

    /// Query due tasks, email them and record the audit trail.
    ///
    /// Query errors abort the run. Send errors only count as skipped, and
    /// log/event writes after a successful send are best effort.
    pub async fn run_send(&self, options: NotifyOptions) -> Result<SendSummary> {
        let due_rows = self.store.list_due(options.within_days).await?;

        if due_rows.is_empty() {
            tracing::info!("No tasks due within {} days", options.within_days);
            return Ok(SendSummary::default());
        }

        tracing::info!(
            "Found {} tasks due within {} days",
            due_rows.len(),
            options.within_days
        );

        let now = self.now();
        let subject = render::subject(options.within_days, now.date_naive());
        let generated = now.format("%Y-%m-%d %H:%M").to_string();

        let summary = match &self.recipient_mode {
            RecipientMode::Static(recipients) => {
                self.send_static(&due_rows, recipients, &subject, &generated, options)
                    .await
            }
            RecipientMode::PerTask => {
                self.send_per_recipient(&due_rows, &subject, &generated, options)
                    .await?
            }
        };

        tracing::info!(
            "Send finished: rows={} recipients={} sent={} skipped={}",
            summary.rows_found,
            summary.distinct_recipients,
            summary.sent,
            summary.skipped
        );

        Ok(summary)
    }

    async fn send_static(
        &self,
        due_rows: &[DueTask],
        recipients: &StaticRecipients,
        subject: &str,
        generated: &str,
        options: NotifyOptions,
    ) -> SendSummary {
        let mut summary = SendSummary {
            rows_found: due_rows.len(),
            ..Default::default()
        };

        if recipients.is_empty() {
            tracing::warn!("Static recipient mode but no SCHEDULER_DEFAULT_* addresses configured");
            summary.skipped = 1;
            return summary;
        }

        summary.distinct_recipients = 1;

        if options.dry_run {
            tracing::info!(
                "[DRY-RUN] Would send {} tasks to to={:?} cc={:?} bcc={:?}",
                due_rows.len(),
                recipients.to,
                recipients.cc,
                recipients.bcc
            );
            summary.skipped = 1;
            return summary;
        }

        let email = OutgoingEmail::new(
            subject,
            render::render_html(due_rows, options.within_days, generated),
            recipients.to.clone(),
        )
        .with_text(render::render_text(due_rows, options.within_days, generated))
        .with_cc(recipients.cc.clone())
        .with_bcc(recipients.bcc.clone());

        if let Err(e) = self.mailer.send(&email).await {
            tracing::warn!("Failed to send consolidated notification: {}", e);
            summary.skipped = 1;
            return summary;
        }

        for row in due_rows {
            for address in &recipients.to {
                self.log_unless_throttled(row.task_id, address, subject, options.throttle_days)
                    .await;
            }
        }

        if options.advance_on_send {
            let mut tracker = AdvanceTracker::default();
            for row in due_rows {
                let notes = format!("AUTO_RESET: mailed {}", self.now().to_rfc3339());
                tracker.advance(self.store.as_ref(), row.task_id, notes).await;
            }
        }

        summary.sent = 1;
        summary
    }

    async fn send_per_recipient(
        &self,
        due_rows: &[DueTask],
        subject: &str,
        generated: &str,
        options: NotifyOptions,
    ) -> Result<SendSummary> {
        let batches = self.group_by_recipient(due_rows, options.throttle_days).await?;

        let mut summary = SendSummary {
            rows_found: due_rows.len(),
            distinct_recipients: batches.len(),
            ..Default::default()
        };

        // Shared across recipients: a task advances at most once per run.
        let mut tracker = AdvanceTracker::default();

        for batch in &batches {
            if options.dry_run {
                tracing::info!(
                    "[DRY-RUN] Would send {} tasks to {}",
                    batch.rows.len(),
                    batch.email
                );
                summary.skipped += 1;
                continue;
            }

            let email = OutgoingEmail::new(
                subject,
                render::render_html(&batch.rows, options.within_days, generated),
                vec![batch.email.clone()],
            )
            .with_text(render::render_text(&batch.rows, options.within_days, generated));

            if let Err(e) = self.mailer.send(&email).await {
                tracing::warn!("Failed to notify {}: {}", batch.email, e);
                summary.skipped += 1;
                continue;
            }

            tracing::info!("Notified {} about {} tasks", batch.email, batch.rows.len());

            for (row, address) in batch.rows.iter().zip(&batch.checked_as) {
                let entry = NotificationLogEntry::due_time(row.task_id, address, subject);
                if let Err(e) = self.store.log_notification(&entry).await {
                    tracing::warn!(
                        "Failed to log notification for task {} to {}: {}",
                        row.task_id,
                        address,
                        e
                    );
                }

                if options.advance_on_send {
                    let notes = format!(
                        "AUTO_RESET: mailed to {} at {}",
                        batch.email,
                        self.now().to_rfc3339()
                    );
                    tracker.advance(self.store.as_ref(), row.task_id, notes).await;
                }
            }

            summary.sent += 1;
        }

        Ok(summary)
    }

    /// Group non-throttled (task, recipient) pairs by recipient, keeping
    /// first-seen recipient order and spelling for the envelope.
    async fn group_by_recipient(
        &self,
        due_rows: &[DueTask],
        throttle_days: u32,
    ) -> Result<Vec<RecipientBatch>> {
        let mut batches: Vec<RecipientBatch> = Vec::new();
        let mut index: HashMap<String, usize> = HashMap::new();

        for row in due_rows {
            let emails = recipients::resolve_for_task(self.store.as_ref(), row.task_id).await?;
            if emails.is_empty() {
                tracing::debug!("Task {} has no responsible operator email", row.task_id);
            }

            for email in emails {
                if self
                    .store
                    .was_recently_notified(row.task_id, &email, throttle_days)
                    .await?
                {
                    tracing::debug!("Throttled task {} for {}", row.task_id, email);
                    continue;
                }

                let slot = *index.entry(email.to_lowercase()).or_insert_with(|| {
                    batches.push(RecipientBatch {
                        email: email.clone(),
                        rows: Vec::new(),
                        checked_as: Vec::new(),
                    });
                    batches.len() - 1
                });
                batches[slot].rows.push(row.clone());
                batches[slot].checked_as.push(email);
            }
        }

        Ok(batches)
    }

    async fn log_unless_throttled(
        &self,
        task_id: i64,
        email: &str,
        subject: &str,
        throttle_days: u32,
    ) {
        if let Err(e) = self
            .try_log_unless_throttled(task_id, email, subject, throttle_days)
            .await
        {
            tracing::warn!(
                "Failed to log notification for task {} to {}: {}",
                task_id,
                email,
                e
            );
        }
    }

    async fn try_log_unless_throttled(
        &self,
        task_id: i64,
        email: &str,
        subject: &str,
        throttle_days: u32,
    ) -> Result<u64> {
        if self
            .store
            .was_recently_notified(task_id, email, throttle_days)
            .await?
        {
            return Ok(0);
        }
        let entry = NotificationLogEntry::due_time(task_id, email, subject);
        self.store.log_notification(&entry).await
    }
}
