use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "notification_type", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum NotificationType {
    NewIncident,
    IncidentUpdated,
}

/// Outbox row as the dispatcher reads it. The status, last_error and
/// timestamp columns are managed in SQL and never cross into Rust.
#[derive(Debug, Clone, FromRow)]
pub struct IncidentEvent {
    pub id: Uuid,
    pub incident_id: Uuid,
    pub event_type: NotificationType,
    pub message: String,
    pub revision: i32,
    pub attempts: i32,
}

/// Notification message templates, shared by the service writing outbox
/// rows and the tests asserting on them.
pub fn new_incident_message(title: &str) -> String {
    format!("New incident reported: {}", title)
}

pub fn incident_updated_message(title: &str) -> String {
    format!("Incident updated: {}", title)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_message_templates() {
        assert_eq!(
            new_incident_message("Broken streetlight"),
            "New incident reported: Broken streetlight"
        );
        assert_eq!(
            incident_updated_message("Broken streetlight"),
            "Incident updated: Broken streetlight"
        );
    }
}
