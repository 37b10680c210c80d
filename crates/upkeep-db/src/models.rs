use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use upkeep_core::{DueTask, MaintenanceEvent, MaintenanceTask, Operator};

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct DueTaskRecord {
    pub task_id: i64,
    pub title: String,
    pub next_due_at: NaiveDateTime,
    pub department_name: Option<String>,
    pub area_label: Option<String>,
}

impl From<DueTaskRecord> for DueTask {
    fn from(r: DueTaskRecord) -> Self {
        DueTask {
            task_id: r.task_id,
            title: r.title,
            next_due_at: r.next_due_at,
            department_name: r.department_name,
            area_label: r.area_label,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct TaskRecord {
    pub id: i64,
    pub title: String,
    pub active: bool,
    pub responsible_operator_id: Option<i64>,
    pub area_label: Option<String>,
    pub department_id: Option<i64>,
}

impl From<TaskRecord> for MaintenanceTask {
    fn from(r: TaskRecord) -> Self {
        MaintenanceTask {
            id: r.id,
            title: r.title,
            active: r.active,
            responsible_operator_id: r.responsible_operator_id,
            area_label: r.area_label,
            department_id: r.department_id,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct OperatorRecord {
    pub id: i64,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub email: Option<String>,
}

impl From<OperatorRecord> for Operator {
    fn from(r: OperatorRecord) -> Self {
        let name = [r.first_name.as_deref(), r.last_name.as_deref()]
            .into_iter()
            .flatten()
            .collect::<Vec<_>>()
            .join(" ");

        Operator {
            id: r.id,
            name,
            email: r.email,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct EventRecord {
    pub id: i64,
    pub task_id: i64,
    pub done_at: NaiveDateTime,
    pub done_by_operator_id: Option<i64>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub notes: Option<String>,
}

impl From<EventRecord> for MaintenanceEvent {
    fn from(r: EventRecord) -> Self {
        MaintenanceEvent {
            id: r.id,
            task_id: r.task_id,
            done_at: r.done_at,
            done_by_operator_id: r.done_by_operator_id,
            operator_first_name: r.first_name,
            operator_last_name: r.last_name,
            notes: r.notes,
        }
    }
}
