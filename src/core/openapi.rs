use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};

use crate::features::auth;
use crate::features::categories::{dtos as categories_dtos, handlers as categories_handlers, models as categories_models};
use crate::features::incidents::{dtos as incidents_dtos, handlers as incidents_handlers, models as incidents_models};
use crate::features::notifications::{
    dtos as notifications_dtos, handlers as notifications_handlers,
    models as notifications_models,
};
use crate::features::users::{dtos as users_dtos, handlers as users_handlers};
use crate::shared::types::{ApiResponse, Pagination};

#[derive(OpenApi)]
#[openapi(
    paths(
        // Auth
        auth::handlers::register,
        auth::handlers::login,
        auth::handlers::logout,
        // Users
        users_handlers::get_profile,
        users_handlers::update_profile,
        users_handlers::add_profile_image,
        users_handlers::remove_profile_image,
        // Categories
        categories_handlers::list_categories,
        categories_handlers::get_category,
        categories_handlers::create_category,
        categories_handlers::update_category,
        categories_handlers::delete_category,
        // Incidents
        incidents_handlers::list_incidents,
        incidents_handlers::incident_stats,
        incidents_handlers::list_my_incidents,
        incidents_handlers::list_category_incidents,
        incidents_handlers::get_incident,
        incidents_handlers::create_incident,
        incidents_handlers::update_incident,
        incidents_handlers::delete_incident,
        incidents_handlers::attach_images,
        incidents_handlers::detach_images,
        // Notifications
        notifications_handlers::list_notifications,
        notifications_handlers::list_unread_notifications,
        notifications_handlers::mark_notification_read,
        notifications_handlers::mark_all_notifications_read,
        notifications_handlers::delete_notification,
    ),
    components(
        schemas(
            // Shared
            Pagination,
            // Auth
            auth::model::CurrentUser,
            auth::dtos::RegisterDto,
            auth::dtos::LoginDto,
            auth::dtos::AuthResponseDto,
            // Users
            users_dtos::UpdateProfileDto,
            // Categories
            categories_models::Category,
            categories_dtos::CreateCategoryDto,
            categories_dtos::UpdateCategoryDto,
            // Incidents
            incidents_models::IncidentStatus,
            incidents_models::IncidentPriority,
            incidents_models::GeoPoint,
            incidents_dtos::IncidentDto,
            incidents_dtos::IncidentListItemDto,
            incidents_dtos::UserSummaryDto,
            incidents_dtos::CategorySummaryDto,
            incidents_dtos::DeleteImagesDto,
            incidents_dtos::CategoryStatDto,
            incidents_dtos::IncidentStatsDto,
            // Notifications
            notifications_models::NotificationType,
            notifications_dtos::NotificationDto,
            // Envelopes
            ApiResponse<auth::dtos::AuthResponseDto>,
            ApiResponse<auth::model::CurrentUser>,
            ApiResponse<Vec<categories_models::Category>>,
            ApiResponse<categories_models::Category>,
            ApiResponse<incidents_dtos::IncidentDto>,
            ApiResponse<Vec<incidents_dtos::IncidentListItemDto>>,
            ApiResponse<incidents_dtos::IncidentStatsDto>,
            ApiResponse<Vec<String>>,
            ApiResponse<Vec<notifications_dtos::NotificationDto>>,
        )
    ),
    tags(
        (name = "auth", description = "Registration and login"),
        (name = "users", description = "User profile management"),
        (name = "categories", description = "Incident categories"),
        (name = "incidents", description = "Citizen incident reports"),
        (name = "notifications", description = "Per-user incident notifications"),
    ),
    modifiers(&SecurityAddon),
    info(
        title = "CivicWatch API",
        version = "0.1.0",
        description = "API documentation for CivicWatch",
    )
)]
pub struct ApiDoc;

/// Adds Bearer JWT security scheme to OpenAPI spec
struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            );
        }
    }
}

/// Modifier to override OpenAPI info from config
pub struct SwaggerInfoModifier {
    pub title: String,
    pub version: String,
    pub description: String,
}

impl Modify for SwaggerInfoModifier {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        openapi.info.title = self.title.clone();
        openapi.info.version = self.version.clone();
        openapi.info.description = Some(self.description.clone());
    }
}
