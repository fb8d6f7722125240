use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use crate::core::error::{AppError, Result};
use crate::features::incidents::dtos::{
    CategoryIncidentsQuery, CategoryStatDto, CategorySummaryDto, IncidentDto, IncidentListItemDto,
    IncidentStatsDto, ListIncidentsQuery, SortField, SortOrder, UserSummaryDto,
};
use crate::features::incidents::models::Incident;
use crate::shared::types::PaginationQuery;

const LIST_COLUMNS: &str = r#"
    i.*,
    u.first_name AS reporter_first_name,
    u.last_name AS reporter_last_name,
    u.email AS reporter_email,
    u.image AS reporter_image,
    u.organization AS reporter_organization,
    c.name AS category_name,
    a.first_name AS assignee_first_name,
    a.last_name AS assignee_last_name,
    a.email AS assignee_email,
    a.image AS assignee_image,
    a.organization AS assignee_organization
"#;

const LIST_JOINS: &str = r#"
    FROM incidents i
    JOIN users u ON u.id = i.user_id
    JOIN categories c ON c.id = i.category_id
    LEFT JOIN users a ON a.id = i.assigned_to
"#;

#[derive(Debug, FromRow)]
struct IncidentListRow {
    #[sqlx(flatten)]
    incident: Incident,
    reporter_first_name: String,
    reporter_last_name: String,
    reporter_email: String,
    reporter_image: Option<String>,
    reporter_organization: Option<String>,
    category_name: String,
    assignee_first_name: Option<String>,
    assignee_last_name: Option<String>,
    assignee_email: Option<String>,
    assignee_image: Option<String>,
    assignee_organization: Option<String>,
}

impl From<IncidentListRow> for IncidentListItemDto {
    fn from(row: IncidentListRow) -> Self {
        let assignee = match (row.incident.assigned_to, row.assignee_first_name) {
            (Some(id), Some(first_name)) => Some(UserSummaryDto {
                id,
                first_name,
                last_name: row.assignee_last_name.unwrap_or_default(),
                email: row.assignee_email.unwrap_or_default(),
                image: row.assignee_image,
                organization: row.assignee_organization,
            }),
            _ => None,
        };

        Self {
            reporter: UserSummaryDto {
                id: row.incident.user_id,
                first_name: row.reporter_first_name,
                last_name: row.reporter_last_name,
                email: row.reporter_email,
                image: row.reporter_image,
                organization: row.reporter_organization,
            },
            category: CategorySummaryDto {
                id: row.incident.category_id,
                name: row.category_name,
            },
            assignee,
            incident: IncidentDto::from(row.incident),
        }
    }
}

/// Read side of the incidents feature: paginated, sorted, filtered lists
/// and the per-category stats aggregation.
#[derive(Clone)]
pub struct IncidentQueryService {
    pool: PgPool,
}

impl IncidentQueryService {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// All incidents, newest first unless told otherwise.
    pub async fn list(
        &self,
        query: &ListIncidentsQuery,
    ) -> Result<(Vec<IncidentListItemDto>, i64)> {
        let total = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM incidents")
            .fetch_one(&self.pool)
            .await?;

        let pagination = query.pagination();
        let rows = self
            .fetch_page("", query.sort_by, query.sort_order, &pagination, None)
            .await?;

        Ok((rows, total))
    }

    /// Incidents reported by one user.
    pub async fn list_by_user(
        &self,
        user_id: Uuid,
        pagination: &PaginationQuery,
    ) -> Result<(Vec<IncidentListItemDto>, i64)> {
        let total =
            sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM incidents WHERE user_id = $1")
                .bind(user_id)
                .fetch_one(&self.pool)
                .await?;

        let rows = self
            .fetch_page(
                "WHERE i.user_id = $1",
                SortField::CreatedAt,
                SortOrder::Desc,
                pagination,
                Some(FilterBind::Uuid(user_id)),
            )
            .await?;

        Ok((rows, total))
    }

    /// Incidents in one category, optionally narrowed to a status.
    pub async fn list_by_category(
        &self,
        category_id: Uuid,
        query: &CategoryIncidentsQuery,
    ) -> Result<(Vec<IncidentListItemDto>, i64)> {
        let known =
            sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM categories WHERE id = $1")
                .bind(category_id)
                .fetch_one(&self.pool)
                .await?;
        if known == 0 {
            return Err(AppError::NotFound("Category not found".to_string()));
        }

        let total = sqlx::query_scalar::<_, i64>(
            r#"
            SELECT COUNT(*) FROM incidents
            WHERE category_id = $1 AND ($2::incident_status IS NULL OR status = $2)
            "#,
        )
        .bind(category_id)
        .bind(query.status)
        .fetch_one(&self.pool)
        .await?;

        let sql = format!(
            "SELECT {} {} WHERE i.category_id = $1 AND ($2::incident_status IS NULL OR i.status = $2) ORDER BY {} {} LIMIT $3 OFFSET $4",
            LIST_COLUMNS,
            LIST_JOINS,
            query.sort_by.as_column(),
            query.sort_order.as_sql()
        );

        let pagination = query.pagination();
        let rows = sqlx::query_as::<_, IncidentListRow>(&sql)
            .bind(category_id)
            .bind(query.status)
            .bind(pagination.limit())
            .bind(pagination.offset())
            .fetch_all(&self.pool)
            .await?;

        Ok((rows.into_iter().map(Into::into).collect(), total))
    }

    /// Incident counts grouped by category, in a single aggregation.
    /// Categories with no incidents appear with a zero count.
    pub async fn stats(&self) -> Result<IncidentStatsDto> {
        let stats = sqlx::query_as::<_, CategoryCountRow>(
            r#"
            SELECT c.id AS category_id, c.name AS category, COUNT(i.id) AS count
            FROM categories c
            LEFT JOIN incidents i ON i.category_id = c.id
            GROUP BY c.id, c.name
            ORDER BY LOWER(c.name)
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        let total = stats.iter().map(|s| s.count).sum();
        Ok(IncidentStatsDto {
            stats: stats
                .into_iter()
                .map(|s| CategoryStatDto {
                    category_id: s.category_id,
                    category: s.category,
                    count: s.count,
                })
                .collect(),
            total,
        })
    }

    async fn fetch_page(
        &self,
        where_clause: &str,
        sort_by: SortField,
        sort_order: SortOrder,
        pagination: &PaginationQuery,
        filter: Option<FilterBind>,
    ) -> Result<Vec<IncidentListItemDto>> {
        // Sort column and direction come from allow-list enums, never
        // from raw request input.
        let (limit_param, offset_param) = match filter {
            Some(_) => ("$2", "$3"),
            None => ("$1", "$2"),
        };
        let sql = format!(
            "SELECT {} {} {} ORDER BY {} {} LIMIT {} OFFSET {}",
            LIST_COLUMNS,
            LIST_JOINS,
            where_clause,
            sort_by.as_column(),
            sort_order.as_sql(),
            limit_param,
            offset_param
        );

        let mut query = sqlx::query_as::<_, IncidentListRow>(&sql);
        if let Some(FilterBind::Uuid(id)) = filter {
            query = query.bind(id);
        }
        let rows = query
            .bind(pagination.limit())
            .bind(pagination.offset())
            .fetch_all(&self.pool)
            .await?;

        Ok(rows.into_iter().map(Into::into).collect())
    }
}

enum FilterBind {
    Uuid(Uuid),
}

#[derive(Debug, FromRow)]
struct CategoryCountRow {
    category_id: Uuid,
    category: String,
    count: i64,
}
