use std::sync::Arc;

use sqlx::PgPool;
use tracing::{info, warn};
use uuid::Uuid;

use crate::core::error::{AppError, Result};
use crate::features::auth::model::CurrentUser;
use crate::features::incidents::models::Incident;
use crate::modules::storage::{direct_view_url, StorageClient};
use crate::shared::constants::{is_image_mime_allowed, MAX_IMAGE_SIZE};
use crate::shared::validation::sanitize_filename;

/// A photo pulled out of a multipart request, not yet stored.
pub struct UploadedImage {
    pub filename: String,
    pub content_type: String,
    pub data: Vec<u8>,
}

/// Photo attach/detach for incidents.
///
/// Attach is all-or-nothing: either every file in the batch is stored and
/// linked, or none are and already-stored blobs are deleted best-effort.
/// Detach is best-effort per blob, since a missing blob should not keep
/// the reference alive.
#[derive(Clone)]
pub struct ImageService {
    pool: PgPool,
    storage: Arc<StorageClient>,
}

impl ImageService {
    pub fn new(pool: PgPool, storage: Arc<StorageClient>) -> Self {
        Self { pool, storage }
    }

    /// Validate and store a batch of photos under the incident's prefix.
    /// Returns their public URLs. Does not touch the incidents table.
    pub async fn store_batch(
        &self,
        incident_id: Uuid,
        files: Vec<UploadedImage>,
    ) -> Result<Vec<String>> {
        for file in &files {
            if !is_image_mime_allowed(&file.content_type) {
                return Err(AppError::Validation(format!(
                    "Unsupported image type: {}",
                    file.content_type
                )));
            }
            if file.data.len() > MAX_IMAGE_SIZE {
                return Err(AppError::Validation(format!(
                    "Image '{}' exceeds the 5MB size limit",
                    file.filename
                )));
            }
        }

        let mut urls = Vec::with_capacity(files.len());
        for file in files {
            let key = format!(
                "incidents/{}/{}-{}",
                incident_id,
                Uuid::now_v7(),
                sanitize_filename(&file.filename)
            );

            match self.storage.upload(&key, file.data, &file.content_type).await {
                Ok(url) => urls.push(direct_view_url(&url)),
                Err(e) => {
                    self.rollback_uploads(&urls).await;
                    return Err(e);
                }
            }
        }

        Ok(urls)
    }

    /// Delete stored blobs after a failed batch, best-effort.
    pub async fn rollback_uploads(&self, urls: &[String]) {
        for url in urls {
            if let Some(key) = self.storage.key_from_url(url) {
                if let Err(e) = self.storage.delete(&key).await {
                    warn!("Failed to roll back uploaded image '{}': {}", key, e);
                }
            }
        }
    }

    /// Store a batch and append the URLs to an existing incident.
    pub async fn attach(
        &self,
        incident_id: Uuid,
        actor: &CurrentUser,
        files: Vec<UploadedImage>,
    ) -> Result<Vec<String>> {
        if files.is_empty() {
            return Err(AppError::BadRequest("No image files provided".to_string()));
        }

        let incident = self.fetch_owned(incident_id, actor).await?;
        let urls = self.store_batch(incident.id, files).await?;

        let result = sqlx::query(
            "UPDATE incidents SET images = images || $2, updated_at = NOW() WHERE id = $1",
        )
        .bind(incident.id)
        .bind(&urls)
        .execute(&self.pool)
        .await;

        if let Err(e) = result {
            self.rollback_uploads(&urls).await;
            return Err(e.into());
        }

        info!(incident_id = %incident.id, count = urls.len(), "Attached images to incident");
        Ok(urls)
    }

    /// Unlink the given URLs from the incident and delete their blobs.
    /// Blob deletion failures are logged, not returned; the references
    /// are removed regardless.
    pub async fn detach(
        &self,
        incident_id: Uuid,
        actor: &CurrentUser,
        urls: Vec<String>,
    ) -> Result<Vec<String>> {
        if urls.is_empty() {
            return Err(AppError::BadRequest("No image URLs provided".to_string()));
        }

        let incident = self.fetch_owned(incident_id, actor).await?;

        if let Some(url) = first_unattached(&incident.images, &urls) {
            return Err(AppError::BadRequest(format!(
                "Image not attached to this incident: {}",
                url
            )));
        }

        let remaining = remaining_images(&incident.images, &urls);

        sqlx::query("UPDATE incidents SET images = $2, updated_at = NOW() WHERE id = $1")
            .bind(incident.id)
            .bind(&remaining)
            .execute(&self.pool)
            .await?;

        for url in &urls {
            if let Some(key) = self.storage.key_from_url(url) {
                if let Err(e) = self.storage.delete(&key).await {
                    warn!(incident_id = %incident.id, "Failed to delete detached image '{}': {}", key, e);
                }
            }
        }

        info!(incident_id = %incident.id, count = urls.len(), "Detached images from incident");
        Ok(remaining)
    }

    async fn fetch_owned(&self, incident_id: Uuid, actor: &CurrentUser) -> Result<Incident> {
        let incident =
            sqlx::query_as::<_, Incident>("SELECT * FROM incidents WHERE id = $1")
                .bind(incident_id)
                .fetch_optional(&self.pool)
                .await?
                .ok_or_else(|| AppError::NotFound("Incident not found".to_string()))?;

        if incident.user_id != actor.id {
            return Err(AppError::Forbidden(
                "Not authorized to modify this incident".to_string(),
            ));
        }
        Ok(incident)
    }
}

/// First requested URL that is not in the attached list, if any.
fn first_unattached<'a>(attached: &[String], requested: &'a [String]) -> Option<&'a str> {
    requested
        .iter()
        .find(|u| !attached.contains(u))
        .map(String::as_str)
}

/// Attached list minus the removed URLs, original order preserved.
fn remaining_images(attached: &[String], removed: &[String]) -> Vec<String> {
    attached
        .iter()
        .filter(|u| !removed.contains(u))
        .cloned()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn urls(names: &[&str]) -> Vec<String> {
        names
            .iter()
            .map(|n| format!("http://localhost:9000/civicwatch/incidents/abc/{}", n))
            .collect()
    }

    #[test]
    fn test_detach_subset_keeps_the_rest_in_order() {
        let attached = urls(&["a.jpg", "b.jpg", "c.jpg"]);
        let removed = urls(&["b.jpg"]);

        assert!(first_unattached(&attached, &removed).is_none());
        assert_eq!(
            remaining_images(&attached, &removed),
            urls(&["a.jpg", "c.jpg"])
        );
    }

    #[test]
    fn test_detach_everything_leaves_empty_list() {
        let attached = urls(&["a.jpg", "b.jpg"]);
        assert!(remaining_images(&attached, &attached).is_empty());
    }

    #[test]
    fn test_unknown_url_is_reported() {
        let attached = urls(&["a.jpg"]);
        let removed = urls(&["a.jpg", "ghost.jpg"]);

        let unknown = first_unattached(&attached, &removed);
        assert_eq!(unknown, Some(urls(&["ghost.jpg"])[0].as_str()));
    }

    #[test]
    fn test_detach_from_empty_incident_rejects_any_url() {
        let removed = urls(&["a.jpg"]);
        assert!(first_unattached(&[], &removed).is_some());
    }
}
