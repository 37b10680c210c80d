use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// A maintenance task as edited outside this system.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MaintenanceTask {
    pub id: i64,
    pub title: String,
    pub active: bool,
    pub responsible_operator_id: Option<i64>,
    pub area_label: Option<String>,
    pub department_id: Option<i64>,
}

/// Row of the next-due view joined with task and department metadata.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DueTask {
    pub task_id: i64,
    pub title: String,
    pub next_due_at: NaiveDateTime,
    pub department_name: Option<String>,
    pub area_label: Option<String>,
}

impl DueTask {
    /// Department name when present, otherwise the free-form area label.
    pub fn area(&self) -> &str {
        self.department_name
            .as_deref()
            .filter(|s| !s.is_empty())
            .or(self.area_label.as_deref())
            .unwrap_or("")
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Operator {
    pub id: i64,
    pub name: String,
    pub email: Option<String>,
}

/// Append-only record of a notification that went out.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NotificationLogEntry {
    pub task_id: i64,
    pub recipient_email: String,
    pub subject: String,
    pub reason: String,
    pub sent_at: Option<NaiveDateTime>,
}

impl NotificationLogEntry {
    pub const REASON_DUE_TIME: &'static str = "due_time";

    pub fn due_time(task_id: i64, recipient_email: &str, subject: &str) -> Self {
        Self {
            task_id,
            recipient_email: recipient_email.to_string(),
            subject: subject.to_string(),
            reason: Self::REASON_DUE_TIME.to_string(),
            sent_at: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MaintenanceEvent {
    pub id: i64,
    pub task_id: i64,
    pub done_at: NaiveDateTime,
    pub done_by_operator_id: Option<i64>,
    pub operator_first_name: Option<String>,
    pub operator_last_name: Option<String>,
    pub notes: Option<String>,
}

impl MaintenanceEvent {
    pub fn operator_name(&self) -> String {
        [
            self.operator_first_name.as_deref(),
            self.operator_last_name.as_deref(),
        ]
        .into_iter()
        .flatten()
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
    }
}

/// Fixed distribution list taken from configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StaticRecipients {
    pub to: Vec<String>,
    pub cc: Vec<String>,
    pub bcc: Vec<String>,
}

impl StaticRecipients {
    pub fn is_empty(&self) -> bool {
        self.to.is_empty() && self.cc.is_empty() && self.bcc.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn due(department: Option<&str>, area: Option<&str>) -> DueTask {
        DueTask {
            task_id: 1,
            title: "Boiler check".to_string(),
            next_due_at: NaiveDate::from_ymd_opt(2025, 3, 1)
                .unwrap()
                .and_hms_opt(0, 0, 0)
                .unwrap(),
            department_name: department.map(str::to_string),
            area_label: area.map(str::to_string),
        }
    }

    #[test]
    fn test_area_prefers_department() {
        assert_eq!(due(Some("Plant"), Some("North")).area(), "Plant");
        assert_eq!(due(None, Some("North")).area(), "North");
        assert_eq!(due(Some(""), Some("North")).area(), "North");
        assert_eq!(due(None, None).area(), "");
    }

    #[test]
    fn test_operator_name_skips_missing_parts() {
        let mut event = MaintenanceEvent {
            id: 1,
            task_id: 1,
            done_at: NaiveDate::from_ymd_opt(2025, 3, 1)
                .unwrap()
                .and_hms_opt(8, 0, 0)
                .unwrap(),
            done_by_operator_id: Some(4),
            operator_first_name: Some("Anna".to_string()),
            operator_last_name: None,
            notes: None,
        };
        assert_eq!(event.operator_name(), "Anna");

        event.operator_last_name = Some("Bianchi".to_string());
        assert_eq!(event.operator_name(), "Anna Bianchi");
    }

    #[test]
    fn test_static_recipients_empty() {
        let mut recipients = StaticRecipients::default();
        assert!(recipients.is_empty());

        recipients.bcc.push("audit@example.com".to_string());
        assert!(!recipients.is_empty());
    }
}
