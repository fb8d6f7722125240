use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::core::error::AppError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "incident_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum IncidentStatus {
    Pending,
    InProgress,
    Resolved,
    Closed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "incident_priority", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum IncidentPriority {
    Low,
    Medium,
    High,
}

/// GeoJSON point, `coordinates` is `[longitude, latitude]`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct GeoPoint {
    #[serde(rename = "type", default = "point_type")]
    pub kind: String,
    pub coordinates: [f64; 2],
}

fn point_type() -> String {
    "Point".to_string()
}

impl GeoPoint {
    pub fn new(longitude: f64, latitude: f64) -> Self {
        Self {
            kind: point_type(),
            coordinates: [longitude, latitude],
        }
    }

    pub fn longitude(&self) -> f64 {
        self.coordinates[0]
    }

    pub fn latitude(&self) -> f64 {
        self.coordinates[1]
    }

    /// Parse a location sent as a JSON string inside a multipart form.
    ///
    /// Accepts `{"type":"Point","coordinates":[lng,lat]}`; the type tag may
    /// be omitted. Rejects anything that is not a Point or whose
    /// coordinates are out of range.
    pub fn parse(raw: &str) -> Result<Self, AppError> {
        let point: GeoPoint = serde_json::from_str(raw)
            .map_err(|e| AppError::Validation(format!("Invalid location: {}", e)))?;
        point.validated()
    }

    fn validated(self) -> Result<Self, AppError> {
        if self.kind != "Point" {
            return Err(AppError::Validation(format!(
                "Unsupported geometry type: {}",
                self.kind
            )));
        }
        let [lng, lat] = self.coordinates;
        if !lng.is_finite() || !lat.is_finite() {
            return Err(AppError::Validation(
                "Location coordinates must be finite numbers".to_string(),
            ));
        }
        if !(-180.0..=180.0).contains(&lng) {
            return Err(AppError::Validation(
                "Longitude must be between -180 and 180".to_string(),
            ));
        }
        if !(-90.0..=90.0).contains(&lat) {
            return Err(AppError::Validation(
                "Latitude must be between -90 and 90".to_string(),
            ));
        }
        Ok(self)
    }
}

/// Database row for an incident report.
///
/// The location is stored as two columns; [`Incident::location`]
/// reassembles the GeoJSON point for responses. `revision` increments on
/// every content update and keys notification fan-out idempotency.
#[derive(Debug, Clone, FromRow)]
pub struct Incident {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub category_id: Uuid,
    pub location_lng: f64,
    pub location_lat: f64,
    pub status: IncidentStatus,
    pub priority: IncidentPriority,
    pub images: Vec<String>,
    pub user_id: Uuid,
    pub assigned_to: Option<Uuid>,
    pub revision: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Incident {
    pub fn location(&self) -> GeoPoint {
        GeoPoint::new(self.location_lng, self.location_lat)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_full_geojson() {
        let point = GeoPoint::parse(r#"{"type":"Point","coordinates":[106.8,-6.2]}"#).unwrap();
        assert_eq!(point.longitude(), 106.8);
        assert_eq!(point.latitude(), -6.2);
    }

    #[test]
    fn test_parse_without_type_tag() {
        let point = GeoPoint::parse(r#"{"coordinates":[0.0,0.0]}"#).unwrap();
        assert_eq!(point.kind, "Point");
    }

    #[test]
    fn test_parse_rejects_bad_input() {
        assert!(GeoPoint::parse("not json").is_err());
        assert!(GeoPoint::parse(r#"{"type":"Polygon","coordinates":[1.0,2.0]}"#).is_err());
        assert!(GeoPoint::parse(r#"{"coordinates":[181.0,0.0]}"#).is_err());
        assert!(GeoPoint::parse(r#"{"coordinates":[0.0,-91.0]}"#).is_err());
        // Wrong arity
        assert!(GeoPoint::parse(r#"{"coordinates":[1.0,2.0,3.0]}"#).is_err());
    }

    #[test]
    fn test_serializes_as_geojson() {
        let json = serde_json::to_value(GeoPoint::new(106.8, -6.2)).unwrap();
        assert_eq!(json["type"], "Point");
        assert_eq!(json["coordinates"][0], 106.8);
        assert_eq!(json["coordinates"][1], -6.2);
    }
}
