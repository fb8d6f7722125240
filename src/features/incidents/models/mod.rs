pub mod incident;

pub use incident::{GeoPoint, Incident, IncidentPriority, IncidentStatus};
