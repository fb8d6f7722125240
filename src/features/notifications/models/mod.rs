pub mod notification;

pub use notification::{
    incident_updated_message, new_incident_message, IncidentEvent, NotificationType,
};
