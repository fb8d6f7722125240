use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

use crate::features::auth::model::CurrentUser;
use crate::shared::validation::{ORGANIZATION_REGEX, PERSON_NAME_REGEX};

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RegisterDto {
    #[validate(
        length(min = 1, max = 50, message = "First name must be 1-50 characters"),
        regex(path = *PERSON_NAME_REGEX, message = "First name contains invalid characters")
    )]
    pub first_name: String,

    #[validate(
        length(min = 1, max = 50, message = "Last name must be 1-50 characters"),
        regex(path = *PERSON_NAME_REGEX, message = "Last name contains invalid characters")
    )]
    pub last_name: String,

    #[validate(email(message = "Invalid email address"))]
    pub email: String,

    #[validate(length(min = 8, max = 128, message = "Password must be 8-128 characters"))]
    pub password: String,

    #[validate(regex(path = *ORGANIZATION_REGEX, message = "Organization contains invalid characters"))]
    pub organization: Option<String>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct LoginDto {
    #[validate(email(message = "Invalid email address"))]
    pub email: String,

    #[validate(length(min = 1, message = "Password is required"))]
    pub password: String,
}

/// Body returned by register and login. The bearer token is carried here,
/// in the JSON body, not in a cookie.
#[derive(Debug, Serialize, ToSchema)]
pub struct AuthResponseDto {
    pub token: String,
    pub user: CurrentUser,
}

#[cfg(test)]
mod tests {
    use super::*;
    use fake::faker::internet::en::SafeEmail;
    use fake::Fake;

    #[test]
    fn test_register_dto_valid() {
        let dto = RegisterDto {
            first_name: "Ana".to_string(),
            last_name: "O'Brien".to_string(),
            email: SafeEmail().fake(),
            password: "longenough".to_string(),
            organization: Some("Ward 5".to_string()),
        };
        assert!(dto.validate().is_ok());
    }

    #[test]
    fn test_register_dto_rejects_bad_fields() {
        let dto = RegisterDto {
            first_name: "Ana2".to_string(),
            last_name: "".to_string(),
            email: "not-an-email".to_string(),
            password: "short".to_string(),
            organization: None,
        };
        let errors = dto.validate().unwrap_err();
        assert!(errors.field_errors().contains_key("first_name"));
        assert!(errors.field_errors().contains_key("email"));
        assert!(errors.field_errors().contains_key("password"));
    }
}
