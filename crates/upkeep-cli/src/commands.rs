use anyhow::Result;
use std::sync::Arc;

use crate::cli::Commands;
use upkeep_core::{
    Error as CoreError, MaintenanceNotifier, MaintenanceStore, NotifyOptions, Settings,
    WarehouseJob,
};
use upkeep_db::Database;
use upkeep_mailer::SmtpMailer;

pub async fn execute(command: Commands, settings: Settings) -> Result<()> {
    let db = Arc::new(Database::new(&settings.database).await?);

    let result = run(command, &settings, db.clone()).await;
    db.close().await;

    result
}

async fn run(command: Commands, settings: &Settings, db: Arc<Database>) -> Result<()> {
    match command {
        Commands::Due { within } => {
            let within = within.unwrap_or(settings.scheduler.within_days);
            let rows = db.list_due(within).await?;

            println!("Due within {} days: {}", within, rows.len());
            println!();

            for row in &rows {
                println!("#{} {}", row.task_id, row.title);
                println!("  Area: {}", row.area());
                println!("  Due: {}", row.next_due_at.format("%Y-%m-%d %H:%M"));
            }
        }

        Commands::Send {
            within,
            throttle,
            dry_run,
            no_advance,
        } => {
            let options = NotifyOptions {
                within_days: within.unwrap_or(settings.scheduler.within_days),
                throttle_days: throttle.unwrap_or(settings.scheduler.throttle_days),
                dry_run,
                advance_on_send: !no_advance,
            };

            let mailer = Arc::new(SmtpMailer::new(settings.smtp.clone()));
            let notifier = MaintenanceNotifier::new(
                db,
                mailer,
                settings.scheduler.recipient_mode.clone(),
                settings.timezone,
            );

            let summary = notifier.run_send(options).await?;
            println!("{}", serde_json::to_string_pretty(&summary)?);
        }

        Commands::MarkDone {
            task_id,
            operator_id,
            notes,
        } => {
            if db.get_task(task_id).await?.is_none() {
                return Err(CoreError::TaskNotFound(task_id).into());
            }

            db.insert_event(task_id, operator_id, notes.as_deref()).await?;
            println!("✓ Completion recorded for task {}", task_id);
        }

        Commands::Events { task_id } => {
            let events = db.list_events(task_id).await?;

            println!("Events for task {}: {}", task_id, events.len());
            println!();

            for event in &events {
                println!("{}  {}", event.done_at.format("%Y-%m-%d %H:%M:%S"), event.operator_name());
                if let Some(notes) = event.notes.as_deref().filter(|n| !n.is_empty()) {
                    println!("  {}", notes);
                }
            }
        }

        Commands::DwhRefresh { dry_run } => {
            let job = WarehouseJob::new(settings.scheduler.dwh_sql_file.clone());
            let summary = job.run(db.as_ref(), dry_run).await?;
            println!("{}", serde_json::to_string_pretty(&summary)?);
        }
    }

    Ok(())
}
