use axum::{
    extract::{Multipart, Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::de::DeserializeOwned;
use tracing::debug;
use uuid::Uuid;

use crate::core::error::{AppError, Result};
use crate::core::extractor::AppJson;
use crate::features::auth::model::CurrentUser;
use crate::features::incidents::dtos::{
    CategoryIncidentsQuery, DeleteImagesDto, IncidentDto, IncidentListItemDto, IncidentStatsDto,
    ListIncidentsQuery,
};
use crate::features::incidents::models::GeoPoint;
use crate::features::incidents::routes::IncidentState;
use crate::features::incidents::services::{IncidentPatch, NewIncident, UploadedImage};
use crate::shared::types::{ApiResponse, Pagination, PaginationQuery};

/// Text fields collected from an incident multipart form.
#[derive(Debug, Default)]
struct IncidentForm {
    title: Option<String>,
    description: Option<String>,
    category_id: Option<String>,
    location: Option<String>,
    status: Option<String>,
    priority: Option<String>,
    assigned_to: Option<String>,
}

impl IncidentForm {
    fn set(&mut self, name: &str, value: String) {
        match name {
            "title" => self.title = Some(value),
            "description" => self.description = Some(value),
            "categoryId" => self.category_id = Some(value),
            "location" => self.location = Some(value),
            "status" => self.status = Some(value),
            "priority" => self.priority = Some(value),
            "assignedTo" => self.assigned_to = Some(value),
            // Unknown fields are ignored, matching lenient form clients
            _ => {}
        }
    }

    fn into_new_incident(self) -> Result<NewIncident> {
        let title = require_text("title", self.title)?;
        // char count, not byte length: the limit matches char_length() in SQL
        if title.trim().chars().count() > 100 {
            return Err(AppError::Validation(
                "Title must be at most 100 characters".to_string(),
            ));
        }
        let description = require_text("description", self.description)?;
        let category_id = parse_uuid("categoryId", &require_text("categoryId", self.category_id)?)?;
        let location = GeoPoint::parse(&require_text("location", self.location)?)?;
        let priority = self.priority.as_deref().map(parse_enum_value).transpose()?;

        Ok(NewIncident {
            title,
            description,
            category_id,
            location,
            priority,
        })
    }

    fn into_patch(self) -> Result<IncidentPatch> {
        if let Some(title) = &self.title {
            if title.trim().is_empty() || title.trim().chars().count() > 100 {
                return Err(AppError::Validation(
                    "Title must be 1-100 characters".to_string(),
                ));
            }
        }
        if let Some(description) = &self.description {
            if description.trim().is_empty() {
                return Err(AppError::Validation(
                    "Description must not be empty".to_string(),
                ));
            }
        }

        Ok(IncidentPatch {
            title: self.title,
            description: self.description,
            category_id: self
                .category_id
                .as_deref()
                .map(|v| parse_uuid("categoryId", v))
                .transpose()?,
            location: self.location.as_deref().map(GeoPoint::parse).transpose()?,
            status: self.status.as_deref().map(parse_enum_value).transpose()?,
            priority: self.priority.as_deref().map(parse_enum_value).transpose()?,
            assigned_to: self
                .assigned_to
                .as_deref()
                .map(|v| parse_uuid("assignedTo", v))
                .transpose()?,
        })
    }
}

fn require_text(name: &str, value: Option<String>) -> Result<String> {
    let value = value.ok_or_else(|| AppError::Validation(format!("Missing field: {}", name)))?;
    if value.trim().is_empty() {
        return Err(AppError::Validation(format!("Field must not be empty: {}", name)));
    }
    Ok(value)
}

fn parse_uuid(name: &str, value: &str) -> Result<Uuid> {
    Uuid::parse_str(value.trim())
        .map_err(|_| AppError::Validation(format!("Invalid UUID in field: {}", name)))
}

fn parse_enum_value<T: DeserializeOwned>(value: &str) -> Result<T> {
    serde_json::from_value(serde_json::Value::String(value.trim().to_string()))
        .map_err(|e| AppError::Validation(format!("Invalid value: {}", e)))
}

/// Drain a multipart request into text fields plus photo files.
async fn read_incident_multipart(
    mut multipart: Multipart,
) -> Result<(IncidentForm, Vec<UploadedImage>)> {
    let mut form = IncidentForm::default();
    let mut files = Vec::new();

    while let Some(field) = multipart.next_field().await.map_err(|e| {
        debug!("Failed to read multipart field: {}", e);
        AppError::BadRequest(format!("Failed to read multipart data: {}", e))
    })? {
        let name = field.name().unwrap_or("").to_string();

        if name == "images" {
            let content_type = field
                .content_type()
                .map(|s| s.to_string())
                .unwrap_or_else(|| "application/octet-stream".to_string());
            let filename = field
                .file_name()
                .map(|s| s.to_string())
                .unwrap_or_else(|| "unnamed".to_string());
            let data = field.bytes().await.map_err(|e| {
                debug!("Failed to read image bytes: {}", e);
                AppError::BadRequest(format!("Failed to read image data: {}", e))
            })?;
            files.push(UploadedImage {
                filename,
                content_type,
                data: data.to_vec(),
            });
        } else {
            let value = field.text().await.map_err(|e| {
                AppError::BadRequest(format!("Failed to read field '{}': {}", name, e))
            })?;
            form.set(&name, value);
        }
    }

    Ok((form, files))
}

/// List all incidents
#[utoipa::path(
    get,
    path = "/api/v1/incidents",
    params(ListIncidentsQuery),
    responses(
        (status = 200, description = "Incidents retrieved", body = ApiResponse<Vec<IncidentListItemDto>>),
        (status = 400, description = "Invalid sort or pagination parameter")
    ),
    tag = "incidents"
)]
pub async fn list_incidents(
    State(state): State<IncidentState>,
    Query(query): Query<ListIncidentsQuery>,
) -> Result<Json<ApiResponse<Vec<IncidentListItemDto>>>> {
    let (items, total) = state.queries.list(&query).await?;
    let pagination = query.pagination();
    Ok(Json(ApiResponse::success(
        Some(items),
        None,
        Some(Pagination::new(total, pagination.page(), pagination.limit())),
    )))
}

/// Incident counts per category
#[utoipa::path(
    get,
    path = "/api/v1/incidents/stats",
    responses(
        (status = 200, description = "Stats retrieved", body = ApiResponse<IncidentStatsDto>)
    ),
    tag = "incidents"
)]
pub async fn incident_stats(
    State(state): State<IncidentState>,
) -> Result<Json<ApiResponse<IncidentStatsDto>>> {
    let stats = state.queries.stats().await?;
    Ok(Json(ApiResponse::success(Some(stats), None, None)))
}

/// List the current user's incidents
#[utoipa::path(
    get,
    path = "/api/v1/incidents/user",
    params(PaginationQuery),
    responses(
        (status = 200, description = "Incidents retrieved", body = ApiResponse<Vec<IncidentListItemDto>>),
        (status = 401, description = "Unauthorized")
    ),
    tag = "incidents",
    security(("bearer_auth" = []))
)]
pub async fn list_my_incidents(
    user: CurrentUser,
    State(state): State<IncidentState>,
    Query(pagination): Query<PaginationQuery>,
) -> Result<Json<ApiResponse<Vec<IncidentListItemDto>>>> {
    let (items, total) = state.queries.list_by_user(user.id, &pagination).await?;
    Ok(Json(ApiResponse::success(
        Some(items),
        None,
        Some(Pagination::new(total, pagination.page(), pagination.limit())),
    )))
}

/// List incidents in a category
#[utoipa::path(
    get,
    path = "/api/v1/incidents/category/{categoryId}",
    params(
        ("categoryId" = Uuid, Path, description = "Category id"),
        CategoryIncidentsQuery
    ),
    responses(
        (status = 200, description = "Incidents retrieved", body = ApiResponse<Vec<IncidentListItemDto>>),
        (status = 404, description = "Category not found")
    ),
    tag = "incidents"
)]
pub async fn list_category_incidents(
    State(state): State<IncidentState>,
    Path(category_id): Path<Uuid>,
    Query(query): Query<CategoryIncidentsQuery>,
) -> Result<Json<ApiResponse<Vec<IncidentListItemDto>>>> {
    let (items, total) = state.queries.list_by_category(category_id, &query).await?;
    let pagination = query.pagination();
    Ok(Json(ApiResponse::success(
        Some(items),
        None,
        Some(Pagination::new(total, pagination.page(), pagination.limit())),
    )))
}

/// Get an incident by id
#[utoipa::path(
    get,
    path = "/api/v1/incidents/{id}",
    params(("id" = Uuid, Path, description = "Incident id")),
    responses(
        (status = 200, description = "Incident retrieved", body = ApiResponse<IncidentDto>),
        (status = 404, description = "Incident not found")
    ),
    tag = "incidents"
)]
pub async fn get_incident(
    State(state): State<IncidentState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<IncidentDto>>> {
    let incident = state.service.get(id).await?;
    Ok(Json(ApiResponse::success(
        Some(IncidentDto::from(incident)),
        None,
        None,
    )))
}

/// Report a new incident
///
/// Accepts multipart/form-data with text fields `title`, `description`,
/// `categoryId`, `location` (GeoJSON point as a JSON string), optional
/// `priority`, and any number of `images` file parts.
#[utoipa::path(
    post,
    path = "/api/v1/incidents",
    tag = "incidents",
    request_body(content_type = "multipart/form-data"),
    responses(
        (status = 201, description = "Incident created", body = ApiResponse<IncidentDto>),
        (status = 400, description = "Validation error"),
        (status = 401, description = "Unauthorized")
    ),
    security(("bearer_auth" = []))
)]
pub async fn create_incident(
    user: CurrentUser,
    State(state): State<IncidentState>,
    multipart: Multipart,
) -> Result<(StatusCode, Json<ApiResponse<IncidentDto>>)> {
    let (form, files) = read_incident_multipart(multipart).await?;
    let data = form.into_new_incident()?;

    let incident = state.service.create(&user, data, files).await?;
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success(
            Some(IncidentDto::from(incident)),
            Some("Incident reported successfully".to_string()),
            None,
        )),
    ))
}

/// Update an incident
///
/// Only the reporter may update. Supplying `images` file parts replaces
/// the photo set; omitting them keeps the existing photos.
#[utoipa::path(
    put,
    path = "/api/v1/incidents/{id}",
    params(("id" = Uuid, Path, description = "Incident id")),
    tag = "incidents",
    request_body(content_type = "multipart/form-data"),
    responses(
        (status = 200, description = "Incident updated", body = ApiResponse<IncidentDto>),
        (status = 400, description = "Validation error"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Not the reporter"),
        (status = 404, description = "Incident not found")
    ),
    security(("bearer_auth" = []))
)]
pub async fn update_incident(
    user: CurrentUser,
    State(state): State<IncidentState>,
    Path(id): Path<Uuid>,
    multipart: Multipart,
) -> Result<Json<ApiResponse<IncidentDto>>> {
    let (form, files) = read_incident_multipart(multipart).await?;
    let patch = form.into_patch()?;

    let incident = state.service.update(id, &user, patch, files).await?;
    Ok(Json(ApiResponse::success(
        Some(IncidentDto::from(incident)),
        Some("Incident updated successfully".to_string()),
        None,
    )))
}

/// Delete an incident
#[utoipa::path(
    delete,
    path = "/api/v1/incidents/{id}",
    params(("id" = Uuid, Path, description = "Incident id")),
    responses(
        (status = 200, description = "Incident deleted"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Not the reporter"),
        (status = 404, description = "Incident not found")
    ),
    tag = "incidents",
    security(("bearer_auth" = []))
)]
pub async fn delete_incident(
    user: CurrentUser,
    State(state): State<IncidentState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<()>>> {
    state.service.delete(id, &user).await?;
    Ok(Json(ApiResponse::success(
        None,
        Some("Incident deleted successfully".to_string()),
        None,
    )))
}

/// Attach photos to an incident
#[utoipa::path(
    post,
    path = "/api/v1/incidents/{id}/images",
    params(("id" = Uuid, Path, description = "Incident id")),
    tag = "incidents",
    request_body(content_type = "multipart/form-data"),
    responses(
        (status = 200, description = "Images attached", body = ApiResponse<Vec<String>>),
        (status = 400, description = "Invalid image batch"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Not the reporter"),
        (status = 404, description = "Incident not found")
    ),
    security(("bearer_auth" = []))
)]
pub async fn attach_images(
    user: CurrentUser,
    State(state): State<IncidentState>,
    Path(id): Path<Uuid>,
    multipart: Multipart,
) -> Result<Json<ApiResponse<Vec<String>>>> {
    let (_, files) = read_incident_multipart(multipart).await?;
    let urls = state.images.attach(id, &user, files).await?;
    Ok(Json(ApiResponse::success(
        Some(urls),
        Some("Images attached successfully".to_string()),
        None,
    )))
}

/// Detach photos from an incident
#[utoipa::path(
    delete,
    path = "/api/v1/incidents/{id}/images",
    params(("id" = Uuid, Path, description = "Incident id")),
    request_body = DeleteImagesDto,
    responses(
        (status = 200, description = "Images detached, remaining URLs returned", body = ApiResponse<Vec<String>>),
        (status = 400, description = "URL not attached to this incident"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Not the reporter"),
        (status = 404, description = "Incident not found")
    ),
    tag = "incidents",
    security(("bearer_auth" = []))
)]
pub async fn detach_images(
    user: CurrentUser,
    State(state): State<IncidentState>,
    Path(id): Path<Uuid>,
    AppJson(dto): AppJson<DeleteImagesDto>,
) -> Result<Json<ApiResponse<Vec<String>>>> {
    let remaining = state.images.detach(id, &user, dto.image_urls).await?;
    Ok(Json(ApiResponse::success(
        Some(remaining),
        Some("Images detached successfully".to_string()),
        None,
    )))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::incidents::models::{IncidentPriority, IncidentStatus};

    fn base_form() -> IncidentForm {
        let mut form = IncidentForm::default();
        form.set("title", "Broken streetlight".to_string());
        form.set("description", "Dark corner at night".to_string());
        form.set("categoryId", Uuid::now_v7().to_string());
        form.set(
            "location",
            r#"{"type":"Point","coordinates":[106.8,-6.2]}"#.to_string(),
        );
        form
    }

    #[test]
    fn test_new_incident_from_form() {
        let data = base_form().into_new_incident().unwrap();
        assert_eq!(data.title, "Broken streetlight");
        assert_eq!(data.location.longitude(), 106.8);
        assert!(data.priority.is_none());
    }

    #[test]
    fn test_new_incident_with_priority() {
        let mut form = base_form();
        form.set("priority", "high".to_string());
        let data = form.into_new_incident().unwrap();
        assert_eq!(data.priority, Some(IncidentPriority::High));
    }

    #[test]
    fn test_new_incident_missing_required_field() {
        let mut form = base_form();
        form.location = None;
        let err = form.into_new_incident().unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }

    #[test]
    fn test_new_incident_rejects_long_title() {
        let mut form = base_form();
        form.title = Some("x".repeat(101));
        assert!(form.into_new_incident().is_err());
    }

    #[test]
    fn test_title_limit_counts_chars_not_bytes() {
        // 60 chars but 120 bytes; must pass a 100-character limit
        let mut form = base_form();
        form.title = Some("é".repeat(60));
        let data = form.into_new_incident().unwrap();
        assert_eq!(data.title.chars().count(), 60);

        let mut form = IncidentForm::default();
        form.set("title", "é".repeat(60));
        assert!(form.into_patch().is_ok());

        let mut form = base_form();
        form.title = Some("é".repeat(101));
        assert!(form.into_new_incident().is_err());
    }

    #[test]
    fn test_new_incident_rejects_bad_location() {
        let mut form = base_form();
        form.location = Some("not geojson".to_string());
        assert!(form.into_new_incident().is_err());
    }

    #[test]
    fn test_patch_all_fields_optional() {
        let patch = IncidentForm::default().into_patch().unwrap();
        assert!(patch.title.is_none());
        assert!(patch.status.is_none());
    }

    #[test]
    fn test_patch_parses_status_and_assignee() {
        let mut form = IncidentForm::default();
        form.set("status", "in_progress".to_string());
        let assignee = Uuid::now_v7();
        form.set("assignedTo", assignee.to_string());

        let patch = form.into_patch().unwrap();
        assert_eq!(patch.status, Some(IncidentStatus::InProgress));
        assert_eq!(patch.assigned_to, Some(assignee));
    }

    #[test]
    fn test_patch_rejects_unknown_status() {
        let mut form = IncidentForm::default();
        form.set("status", "on_fire".to_string());
        assert!(form.into_patch().is_err());
    }

    #[test]
    fn test_patch_rejects_empty_title() {
        let mut form = IncidentForm::default();
        form.set("title", "   ".to_string());
        assert!(form.into_patch().is_err());
    }
}
