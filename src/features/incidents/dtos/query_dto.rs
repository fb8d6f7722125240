use serde::Deserialize;
use utoipa::IntoParams;

use crate::features::incidents::models::IncidentStatus;
use crate::shared::constants::DEFAULT_PAGE_SIZE;
use crate::shared::types::PaginationQuery;

/// Sortable incident columns. Deserializing from the query string is the
/// allow-list: any other value is rejected before it reaches SQL.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SortField {
    #[default]
    CreatedAt,
    UpdatedAt,
    Title,
    Status,
    Priority,
}

impl SortField {
    pub fn as_column(self) -> &'static str {
        match self {
            SortField::CreatedAt => "i.created_at",
            SortField::UpdatedAt => "i.updated_at",
            SortField::Title => "i.title",
            SortField::Status => "i.status",
            SortField::Priority => "i.priority",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    Asc,
    #[default]
    Desc,
}

impl SortOrder {
    pub fn as_sql(self) -> &'static str {
        match self {
            SortOrder::Asc => "ASC",
            SortOrder::Desc => "DESC",
        }
    }
}

/// Query parameters for the public incident list.
#[derive(Debug, Default, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
pub struct ListIncidentsQuery {
    #[serde(default = "default_page")]
    #[param(minimum = 1)]
    pub page: i64,

    #[serde(default = "default_limit")]
    #[param(minimum = 1, maximum = 100)]
    pub limit: i64,

    /// Sort column (createdAt, updatedAt, title, status, priority)
    #[serde(default)]
    #[param(value_type = String)]
    pub sort_by: SortField,

    /// Sort direction (asc, desc)
    #[serde(default)]
    #[param(value_type = String)]
    pub sort_order: SortOrder,
}

impl ListIncidentsQuery {
    pub fn pagination(&self) -> PaginationQuery {
        PaginationQuery {
            page: self.page,
            limit: self.limit,
        }
    }
}

/// Query parameters for listing incidents in a category, with an
/// optional status filter.
#[derive(Debug, Default, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
pub struct CategoryIncidentsQuery {
    #[serde(default = "default_page")]
    #[param(minimum = 1)]
    pub page: i64,

    #[serde(default = "default_limit")]
    #[param(minimum = 1, maximum = 100)]
    pub limit: i64,

    #[serde(default)]
    #[param(value_type = String)]
    pub sort_by: SortField,

    #[serde(default)]
    #[param(value_type = String)]
    pub sort_order: SortOrder,

    /// Only incidents in this status
    #[param(value_type = Option<String>)]
    pub status: Option<IncidentStatus>,
}

impl CategoryIncidentsQuery {
    pub fn pagination(&self) -> PaginationQuery {
        PaginationQuery {
            page: self.page,
            limit: self.limit,
        }
    }
}

fn default_page() -> i64 {
    1
}

fn default_limit() -> i64 {
    DEFAULT_PAGE_SIZE
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Deserialize)]
    struct Wrapper {
        #[serde(default)]
        sort_by: SortField,
        #[serde(default)]
        sort_order: SortOrder,
    }

    #[test]
    fn test_sort_field_allow_list() {
        let w: Wrapper = serde_json::from_str(r#"{"sort_by":"createdAt"}"#).unwrap();
        assert_eq!(w.sort_by, SortField::CreatedAt);

        let w: Wrapper = serde_json::from_str(r#"{"sort_by":"priority","sort_order":"asc"}"#).unwrap();
        assert_eq!(w.sort_by, SortField::Priority);
        assert_eq!(w.sort_order, SortOrder::Asc);

        // Unknown columns are rejected, not passed through to SQL
        assert!(serde_json::from_str::<Wrapper>(r#"{"sort_by":"password_hash"}"#).is_err());
        assert!(serde_json::from_str::<Wrapper>(r#"{"sort_by":"created_at; DROP TABLE"}"#).is_err());
    }

    #[test]
    fn test_sort_defaults() {
        let w: Wrapper = serde_json::from_str("{}").unwrap();
        assert_eq!(w.sort_by, SortField::CreatedAt);
        assert_eq!(w.sort_order, SortOrder::Desc);
        assert_eq!(w.sort_by.as_column(), "i.created_at");
        assert_eq!(w.sort_order.as_sql(), "DESC");
    }
}
