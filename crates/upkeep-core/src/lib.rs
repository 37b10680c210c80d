pub mod config;
pub mod error;
pub mod models;
pub mod notifier;
pub mod recipients;
pub mod render;
pub mod store;
pub mod throttle;
pub mod warehouse;

// Re-exports
pub use config::{DatabaseSettings, RecipientMode, SchedulerSettings, Settings, SmtpSettings};
pub use error::{Error, Result};
pub use models::{
    DueTask, MaintenanceEvent, MaintenanceTask, NotificationLogEntry, Operator,
    StaticRecipients,
};
pub use notifier::{MaintenanceNotifier, NotifyOptions, SendSummary};
pub use store::{Mailer, MaintenanceStore, OutgoingEmail, ScriptSession, SessionProvider};
pub use warehouse::{RefreshSummary, Statement, StatementKind, WarehouseJob};
