use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::features::incidents::models::{GeoPoint, Incident, IncidentPriority, IncidentStatus};

/// Incident as returned by single-resource endpoints.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct IncidentDto {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub category_id: Uuid,
    pub location: GeoPoint,
    pub status: IncidentStatus,
    pub priority: IncidentPriority,
    pub images: Vec<String>,
    pub user_id: Uuid,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub assigned_to: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<Incident> for IncidentDto {
    fn from(incident: Incident) -> Self {
        let location = incident.location();
        Self {
            id: incident.id,
            title: incident.title,
            description: incident.description,
            category_id: incident.category_id,
            location,
            status: incident.status,
            priority: incident.priority,
            images: incident.images,
            user_id: incident.user_id,
            assigned_to: incident.assigned_to,
            created_at: incident.created_at,
            updated_at: incident.updated_at,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UserSummaryDto {
    pub id: Uuid,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub organization: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct CategorySummaryDto {
    pub id: Uuid,
    pub name: String,
}

/// List-endpoint shape: the incident plus resolved reporter, category
/// and assignee summaries.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct IncidentListItemDto {
    #[serde(flatten)]
    pub incident: IncidentDto,
    pub reporter: UserSummaryDto,
    pub category: CategorySummaryDto,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub assignee: Option<UserSummaryDto>,
}

/// Body for detaching photos from an incident.
#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DeleteImagesDto {
    pub image_urls: Vec<String>,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CategoryStatDto {
    pub category_id: Uuid,
    pub category: String,
    pub count: i64,
}

/// Per-category incident counts plus the grand total.
#[derive(Debug, Serialize, ToSchema)]
pub struct IncidentStatsDto {
    pub stats: Vec<CategoryStatDto>,
    pub total: i64,
}
