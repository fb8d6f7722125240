use serde::Deserialize;
use utoipa::ToSchema;
use validator::Validate;

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateCategoryDto {
    #[validate(length(min = 1, max = 50, message = "Name must be 1-50 characters"))]
    pub name: String,

    #[validate(length(max = 200, message = "Description must be at most 200 characters"))]
    pub description: Option<String>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct UpdateCategoryDto {
    #[validate(length(min = 1, max = 50, message = "Name must be 1-50 characters"))]
    pub name: Option<String>,

    #[validate(length(max = 200, message = "Description must be at most 200 characters"))]
    pub description: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_description_capped_at_200_chars() {
        let dto = CreateCategoryDto {
            name: "Road damage".to_string(),
            description: Some("d".repeat(200)),
        };
        assert!(dto.validate().is_ok());

        let dto = CreateCategoryDto {
            name: "Road damage".to_string(),
            description: Some("d".repeat(201)),
        };
        assert!(dto.validate().is_err());

        let dto = UpdateCategoryDto {
            name: None,
            description: Some("d".repeat(201)),
        };
        assert!(dto.validate().is_err());
    }

    #[test]
    fn test_name_must_not_be_empty() {
        let dto = CreateCategoryDto {
            name: String::new(),
            description: None,
        };
        assert!(dto.validate().is_err());
    }
}
