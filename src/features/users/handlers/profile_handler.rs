use axum::{
    extract::{Multipart, State},
    Json,
};
use std::sync::Arc;
use tracing::debug;
use validator::Validate;

use crate::core::error::{AppError, Result};
use crate::core::extractor::AppJson;
use crate::features::auth::model::CurrentUser;
use crate::features::users::dtos::UpdateProfileDto;
use crate::features::users::services::UserService;
use crate::shared::constants::{is_image_mime_allowed, MAX_IMAGE_SIZE};
use crate::shared::types::ApiResponse;

/// Get the current user's profile
#[utoipa::path(
    get,
    path = "/api/v1/users/profile",
    responses(
        (status = 200, description = "Profile retrieved", body = ApiResponse<CurrentUser>),
        (status = 401, description = "Unauthorized")
    ),
    tag = "users",
    security(("bearer_auth" = []))
)]
pub async fn get_profile(
    user: CurrentUser,
    State(service): State<Arc<UserService>>,
) -> Result<Json<ApiResponse<CurrentUser>>> {
    let profile = service.get_profile(user.id).await?;
    Ok(Json(ApiResponse::success(
        Some(CurrentUser::from(profile)),
        None,
        None,
    )))
}

/// Update the current user's profile
#[utoipa::path(
    put,
    path = "/api/v1/users/profile",
    request_body = UpdateProfileDto,
    responses(
        (status = 200, description = "Profile updated", body = ApiResponse<CurrentUser>),
        (status = 400, description = "Validation error"),
        (status = 401, description = "Unauthorized")
    ),
    tag = "users",
    security(("bearer_auth" = []))
)]
pub async fn update_profile(
    user: CurrentUser,
    State(service): State<Arc<UserService>>,
    AppJson(dto): AppJson<UpdateProfileDto>,
) -> Result<Json<ApiResponse<CurrentUser>>> {
    dto.validate()
        .map_err(|e| AppError::Validation(e.to_string()))?;

    let updated = service.update_profile(user.id, dto).await?;
    Ok(Json(ApiResponse::success(
        Some(CurrentUser::from(updated)),
        Some("Profile updated successfully".to_string()),
        None,
    )))
}

/// Upload a profile image
///
/// Accepts multipart/form-data with an `image` field. Replaces any
/// existing profile image.
#[utoipa::path(
    post,
    path = "/api/v1/users/profile/image",
    tag = "users",
    request_body(content_type = "multipart/form-data"),
    responses(
        (status = 200, description = "Profile image updated", body = ApiResponse<CurrentUser>),
        (status = 400, description = "Missing or invalid image"),
        (status = 401, description = "Unauthorized")
    ),
    security(("bearer_auth" = []))
)]
pub async fn add_profile_image(
    user: CurrentUser,
    State(service): State<Arc<UserService>>,
    mut multipart: Multipart,
) -> Result<Json<ApiResponse<CurrentUser>>> {
    let mut image: Option<(String, String, Vec<u8>)> = None;

    while let Some(field) = multipart.next_field().await.map_err(|e| {
        debug!("Failed to read multipart field: {}", e);
        AppError::BadRequest(format!("Failed to read multipart data: {}", e))
    })? {
        if field.name() != Some("image") {
            continue;
        }

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

        image = Some((filename, content_type, data.to_vec()));
    }

    let (filename, content_type, data) =
        image.ok_or_else(|| AppError::BadRequest("No image file provided".to_string()))?;

    if !is_image_mime_allowed(&content_type) {
        return Err(AppError::Validation(format!(
            "Unsupported image type: {}",
            content_type
        )));
    }
    if data.len() > MAX_IMAGE_SIZE {
        return Err(AppError::Validation(
            "Image exceeds the 5MB size limit".to_string(),
        ));
    }

    let updated = service
        .set_profile_image(user.id, &filename, &content_type, data)
        .await?;
    Ok(Json(ApiResponse::success(
        Some(CurrentUser::from(updated)),
        Some("Profile image updated successfully".to_string()),
        None,
    )))
}

/// Remove the profile image
#[utoipa::path(
    delete,
    path = "/api/v1/users/profile/image",
    responses(
        (status = 200, description = "Profile image removed", body = ApiResponse<CurrentUser>),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "No profile image set")
    ),
    tag = "users",
    security(("bearer_auth" = []))
)]
pub async fn remove_profile_image(
    user: CurrentUser,
    State(service): State<Arc<UserService>>,
) -> Result<Json<ApiResponse<CurrentUser>>> {
    let updated = service.remove_profile_image(user.id).await?;
    Ok(Json(ApiResponse::success(
        Some(CurrentUser::from(updated)),
        Some("Profile image removed successfully".to_string()),
        None,
    )))
}
