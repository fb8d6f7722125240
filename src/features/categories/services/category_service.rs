use sqlx::PgPool;
use tracing::info;
use uuid::Uuid;

use crate::core::error::{AppError, Result};
use crate::features::categories::dtos::{CreateCategoryDto, UpdateCategoryDto};
use crate::features::categories::models::Category;

/// Category CRUD. Names are unique case-insensitively.
#[derive(Clone)]
pub struct CategoryService {
    pool: PgPool,
}

impl CategoryService {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn list(&self) -> Result<Vec<Category>> {
        let categories =
            sqlx::query_as::<_, Category>("SELECT * FROM categories ORDER BY LOWER(name)")
                .fetch_all(&self.pool)
                .await?;
        Ok(categories)
    }

    pub async fn get(&self, id: Uuid) -> Result<Category> {
        sqlx::query_as::<_, Category>("SELECT * FROM categories WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound("Category not found".to_string()))
    }

    pub async fn create(&self, dto: CreateCategoryDto) -> Result<Category> {
        self.ensure_name_free(&dto.name, None).await?;

        let category = sqlx::query_as::<_, Category>(
            "INSERT INTO categories (name, description) VALUES ($1, $2) RETURNING *",
        )
        .bind(dto.name.trim())
        .bind(&dto.description)
        .fetch_one(&self.pool)
        .await
        // Concurrent creates can both pass ensure_name_free and race on
        // the unique name index
        .map_err(|e| AppError::on_conflict(e, "Category already exists"))?;

        info!(category_id = %category.id, name = %category.name, "Created category");
        Ok(category)
    }

    pub async fn update(&self, id: Uuid, dto: UpdateCategoryDto) -> Result<Category> {
        if let Some(name) = &dto.name {
            self.ensure_name_free(name, Some(id)).await?;
        }

        sqlx::query_as::<_, Category>(
            r#"
            UPDATE categories
            SET name = COALESCE($2, name),
                description = COALESCE($3, description),
                updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(dto.name.as_deref().map(str::trim))
        .bind(&dto.description)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::on_conflict(e, "Category already exists"))?
        .ok_or_else(|| AppError::NotFound("Category not found".to_string()))
    }

    /// Delete a category. Refused while incidents still reference it.
    pub async fn delete(&self, id: Uuid) -> Result<()> {
        let in_use = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM incidents WHERE category_id = $1",
        )
        .bind(id)
        .fetch_one(&self.pool)
        .await?;

        if in_use > 0 {
            return Err(AppError::Conflict(
                "Category is referenced by existing incidents".to_string(),
            ));
        }

        let result = sqlx::query("DELETE FROM categories WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound("Category not found".to_string()));
        }

        info!(category_id = %id, "Deleted category");
        Ok(())
    }

    async fn ensure_name_free(&self, name: &str, exclude: Option<Uuid>) -> Result<()> {
        let taken = sqlx::query_scalar::<_, i64>(
            r#"
            SELECT COUNT(*) FROM categories
            WHERE LOWER(name) = LOWER($1) AND ($2::uuid IS NULL OR id <> $2)
            "#,
        )
        .bind(name.trim())
        .bind(exclude)
        .fetch_one(&self.pool)
        .await?;

        if taken > 0 {
            return Err(AppError::Conflict("Category already exists".to_string()));
        }
        Ok(())
    }
}
