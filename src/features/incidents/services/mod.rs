pub mod image_service;
pub mod incident_service;
pub mod query_service;

pub use image_service::{ImageService, UploadedImage};
pub use incident_service::{IncidentPatch, IncidentService, NewIncident};
pub use query_service::IncidentQueryService;
