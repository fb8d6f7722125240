use serde::Deserialize;
use utoipa::ToSchema;
use validator::Validate;

use crate::shared::validation::{ORGANIZATION_REGEX, PERSON_NAME_REGEX};

/// Partial profile update; omitted fields keep their current value.
#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateProfileDto {
    #[validate(
        length(min = 1, max = 50, message = "First name must be 1-50 characters"),
        regex(path = *PERSON_NAME_REGEX, message = "First name contains invalid characters")
    )]
    pub first_name: Option<String>,

    #[validate(
        length(min = 1, max = 50, message = "Last name must be 1-50 characters"),
        regex(path = *PERSON_NAME_REGEX, message = "Last name contains invalid characters")
    )]
    pub last_name: Option<String>,

    #[validate(regex(path = *ORGANIZATION_REGEX, message = "Organization contains invalid characters"))]
    pub organization: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_all_fields_optional() {
        let dto = UpdateProfileDto {
            first_name: None,
            last_name: None,
            organization: None,
        };
        assert!(dto.validate().is_ok());
    }

    #[test]
    fn test_present_fields_are_validated() {
        let dto = UpdateProfileDto {
            first_name: Some("2Pac".to_string()),
            last_name: None,
            organization: None,
        };
        assert!(dto.validate().is_err());
    }
}
