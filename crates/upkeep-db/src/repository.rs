use crate::{
    models::{DueTaskRecord, EventRecord, OperatorRecord, TaskRecord},
    Error, Result,
};
use async_trait::async_trait;
use sqlx::mysql::{MySqlArguments, MySqlConnectOptions, MySqlPoolOptions};
use sqlx::query::Query;
use sqlx::{MySql, Pool};
use upkeep_core::{
    DatabaseSettings, DueTask, MaintenanceEvent, MaintenanceStore, MaintenanceTask,
    NotificationLogEntry, Operator, ScriptSession, SessionProvider,
};

use crate::session::DbSession;

#[derive(Clone)]
pub struct Database {
    pool: Pool<MySql>,
}

impl Database {
    /// Create new database connection
    pub async fn new(settings: &DatabaseSettings) -> Result<Self> {
        let options = MySqlConnectOptions::new()
            .host(&settings.host)
            .port(settings.port)
            .username(&settings.username)
            .password(&settings.password)
            .database(&settings.database);

        // Runs are sequential; one connection is all a run ever holds.
        let pool = MySqlPoolOptions::new()
            .max_connections(1)
            .connect_with(options)
            .await
            .map_err(|e| {
                Error::Connection(format!(
                    "{}@{}:{}/{}: {}",
                    settings.username, settings.host, settings.port, settings.database, e
                ))
            })?;

        tracing::debug!(
            "Connected to MySQL {}:{}/{}",
            settings.host,
            settings.port,
            settings.database
        );

        Ok(Self { pool })
    }

    /// Run a single write in its own transaction. Dropping the transaction on
    /// error rolls it back.
    async fn execute_write(&self, query: Query<'_, MySql, MySqlArguments>) -> Result<u64> {
        let mut tx = self.pool.begin().await?;
        let result = query.execute(&mut *tx).await?;
        tx.commit().await?;

        Ok(result.rows_affected())
    }

    // ========================================================================
    // Due tasks
    // ========================================================================

    /// Active tasks whose next due date falls within `within_days` from now
    pub async fn get_due_tasks(&self, within_days: u32) -> Result<Vec<DueTaskRecord>> {
        let records = sqlx::query_as::<_, DueTaskRecord>(
            r#"
            SELECT
              t.id                              AS task_id,
              t.title,
              CAST(v.next_due_at AS DATETIME)   AS next_due_at,
              d.name                            AS department_name,
              t.area_label
            FROM vw_maintenance_next_due v
            JOIN maintenance_tasks t
              ON t.id = v.task_id
            LEFT JOIN departments d
              ON d.id = t.department_id
            WHERE v.next_due_at <= DATE_ADD(NOW(), INTERVAL ? DAY)
              AND t.active = 1
            ORDER BY v.next_due_at ASC, t.title ASC
            "#,
        )
        .bind(within_days)
        .fetch_all(&self.pool)
        .await?;

        Ok(records)
    }

    /// Get task by ID
    pub async fn find_task(&self, task_id: i64) -> Result<Option<TaskRecord>> {
        let record = sqlx::query_as::<_, TaskRecord>(
            r#"
            SELECT id, title, active, responsible_operator_id, area_label, department_id
            FROM maintenance_tasks
            WHERE id = ?
            "#,
        )
        .bind(task_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(record)
    }

    // ========================================================================
    // Recipients & throttling
    // ========================================================================

    /// Responsible operator of a task, when assigned and reachable by email
    pub async fn get_responsible_operators(&self, task_id: i64) -> Result<Vec<OperatorRecord>> {
        let records = sqlx::query_as::<_, OperatorRecord>(
            r#"
            SELECT o.id, o.first_name, o.last_name, o.email
            FROM maintenance_tasks t
            JOIN operators o ON o.id = t.responsible_operator_id
            WHERE t.id = ?
              AND o.email IS NOT NULL
            "#,
        )
        .bind(task_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(records)
    }

    /// Notifications logged for the pair within the last `throttle_days` days
    pub async fn count_recent_notifications(
        &self,
        task_id: i64,
        email: &str,
        throttle_days: u32,
    ) -> Result<i64> {
        let count = sqlx::query_scalar::<_, i64>(
            r#"
            SELECT COUNT(*)
            FROM maintenance_notification_log
            WHERE task_id = ?
              AND recipient_email = ?
              AND sent_at >= DATE_SUB(NOW(), INTERVAL ? DAY)
            "#,
        )
        .bind(task_id)
        .bind(email)
        .bind(throttle_days)
        .fetch_one(&self.pool)
        .await?;

        Ok(count)
    }

    /// Add notification log entry
    pub async fn add_notification_log(&self, entry: &NotificationLogEntry) -> Result<u64> {
        self.execute_write(
            sqlx::query(
                r#"
                INSERT INTO maintenance_notification_log
                  (task_id, recipient_email, subject, reason)
                VALUES (?, ?, ?, ?)
                "#,
            )
            .bind(entry.task_id)
            .bind(&entry.recipient_email)
            .bind(&entry.subject)
            .bind(&entry.reason),
        )
        .await
    }

    // ========================================================================
    // Events
    // ========================================================================

    /// Add maintenance event stamped now
    pub async fn add_event(
        &self,
        task_id: i64,
        done_by_operator_id: Option<i64>,
        notes: Option<&str>,
    ) -> Result<u64> {
        self.execute_write(
            sqlx::query(
                r#"
                INSERT INTO maintenance_events (task_id, done_at, done_by_operator_id, notes)
                VALUES (?, NOW(), ?, ?)
                "#,
            )
            .bind(task_id)
            .bind(done_by_operator_id)
            .bind(notes),
        )
        .await
    }

    /// Get task events, newest first
    pub async fn get_events(&self, task_id: i64) -> Result<Vec<EventRecord>> {
        let records = sqlx::query_as::<_, EventRecord>(
            r#"
            SELECT
              e.id,
              e.task_id,
              e.done_at,
              e.done_by_operator_id,
              o.first_name,
              o.last_name,
              e.notes
            FROM maintenance_events e
            LEFT JOIN operators o ON o.id = e.done_by_operator_id
            WHERE e.task_id = ?
            ORDER BY e.done_at DESC
            "#,
        )
        .bind(task_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(records)
    }

    // ========================================================================
    // Sessions
    // ========================================================================

    /// Dedicated connection for replaying a script statement by statement
    pub async fn session(&self) -> Result<DbSession> {
        let conn = self.pool.acquire().await?;
        Ok(DbSession::new(conn))
    }

    pub async fn close(&self) {
        self.pool.close().await;
    }
}

#[async_trait]
impl MaintenanceStore for Database {
    async fn list_due(&self, within_days: u32) -> upkeep_core::Result<Vec<DueTask>> {
        let records = self.get_due_tasks(within_days).await?;
        Ok(records.into_iter().map(DueTask::from).collect())
    }

    async fn recipients_for_task(&self, task_id: i64) -> upkeep_core::Result<Vec<String>> {
        let operators = self.get_responsible_operators(task_id).await?;

        Ok(operators
            .into_iter()
            .map(Operator::from)
            .filter_map(|op| {
                tracing::debug!("Task {} responsible operator: {} ({})", task_id, op.name, op.id);
                op.email
            })
            .collect())
    }

    async fn was_recently_notified(
        &self,
        task_id: i64,
        email: &str,
        throttle_days: u32,
    ) -> upkeep_core::Result<bool> {
        let count = self
            .count_recent_notifications(task_id, email, throttle_days)
            .await?;
        Ok(count > 0)
    }

    async fn log_notification(&self, entry: &NotificationLogEntry) -> upkeep_core::Result<u64> {
        Ok(self.add_notification_log(entry).await?)
    }

    async fn insert_event(
        &self,
        task_id: i64,
        done_by_operator_id: Option<i64>,
        notes: Option<&str>,
    ) -> upkeep_core::Result<u64> {
        Ok(self.add_event(task_id, done_by_operator_id, notes).await?)
    }

    async fn list_events(&self, task_id: i64) -> upkeep_core::Result<Vec<MaintenanceEvent>> {
        let records = self.get_events(task_id).await?;
        Ok(records.into_iter().map(MaintenanceEvent::from).collect())
    }

    async fn get_task(&self, task_id: i64) -> upkeep_core::Result<Option<MaintenanceTask>> {
        Ok(self.find_task(task_id).await?.map(MaintenanceTask::from))
    }
}

#[async_trait]
impl SessionProvider for Database {
    async fn open_session(&self) -> upkeep_core::Result<Box<dyn ScriptSession>> {
        Ok(Box::new(self.session().await?))
    }
}
