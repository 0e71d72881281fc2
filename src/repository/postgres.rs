use std::future::Future;
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use sqlx::PgPool;

use crate::error::{AppError, DatabaseError};
use crate::models::{
    Category, CategoryFilter, CategoryInput, NewReview, Page, Product, ProductFilter,
    ProductInput, Review, User,
};
use crate::repository::{normalize_filter, StoreRepository};

const USER_COLUMNS: &str =
    "id, name, email, password_hash, is_admin, created_at, updated_at";

const PRODUCT_SELECT: &str = r#"
    SELECT p.id, p.name, p.description, p.price, p.stock_quantity, p.status,
           c.id AS category_id, c.name AS category_name, p.created_at
    FROM products p
    INNER JOIN product_categories pc ON p.id = pc.product_id
    INNER JOIN categories c ON pc.category_id = c.id
"#;

const PRODUCT_FILTER: &str = r#"
    WHERE ($1::TEXT IS NULL OR p.name ILIKE '%' || $1 || '%')
      AND ($2::TEXT IS NULL OR c.name ILIKE '%' || $2 || '%')
      AND ($3::TEXT IS NULL OR p.status ILIKE '%' || $3 || '%')
"#;

/// sqlx-backed repository; every call is bounded by `timeout`
pub struct PostgresRepository {
    pool: PgPool,
    timeout: Duration,
}

impl PostgresRepository {
    pub fn new(pool: PgPool, timeout: Duration) -> Self {
        Self { pool, timeout }
    }

    async fn timed<T, F>(&self, operation: &'static str, fut: F) -> Result<T, AppError>
    where
        F: Future<Output = Result<T, sqlx::Error>> + Send,
    {
        match tokio::time::timeout(self.timeout, fut).await {
            Ok(result) => result.map_err(AppError::from),
            Err(_) => {
                tracing::error!(
                    operation = operation,
                    timeout_ms = self.timeout.as_millis() as u64,
                    "Database call timed out"
                );
                Err(DatabaseError::Timeout.into())
            }
        }
    }
}

fn expect_affected(rows: u64, what: &str) -> Result<(), AppError> {
    if rows == 0 {
        return Err(DatabaseError::NotFound(what.to_string()).into());
    }
    Ok(())
}

#[async_trait]
impl StoreRepository for PostgresRepository {
    async fn user_by_id(&self, id: i64) -> Result<User, AppError> {
        let query = format!("SELECT {} FROM users WHERE id = $1", USER_COLUMNS);
        self.timed(
            "user_by_id",
            sqlx::query_as::<_, User>(&query).bind(id).fetch_optional(&self.pool),
        )
        .await?
        .ok_or_else(|| DatabaseError::NotFound(format!("user {}", id)).into())
    }

    async fn user_by_email(&self, email: &str) -> Result<Option<User>, AppError> {
        let query = format!("SELECT {} FROM users WHERE email = $1", USER_COLUMNS);
        self.timed(
            "user_by_email",
            sqlx::query_as::<_, User>(&query).bind(email).fetch_optional(&self.pool),
        )
        .await
    }

    async fn insert_user(
        &self,
        name: &str,
        email: &str,
        password_hash: &str,
    ) -> Result<i64, AppError> {
        let now = Utc::now();
        let id = self
            .timed(
                "insert_user",
                sqlx::query_scalar::<_, i64>(
                    r#"
                    INSERT INTO users (name, email, password_hash, is_admin, created_at, updated_at)
                    VALUES ($1, $2, $3, false, $4, $4)
                    RETURNING id
                    "#,
                )
                .bind(name)
                .bind(email)
                .bind(password_hash)
                .bind(now)
                .fetch_one(&self.pool),
            )
            .await?;

        tracing::info!(user_id = id, "User row inserted");
        Ok(id)
    }

    async fn update_password(&self, id: i64, password_hash: &str) -> Result<(), AppError> {
        let result = self
            .timed(
                "update_password",
                sqlx::query("UPDATE users SET password_hash = $1, updated_at = $2 WHERE id = $3")
                    .bind(password_hash)
                    .bind(Utc::now())
                    .bind(id)
                    .execute(&self.pool),
            )
            .await?;
        expect_affected(result.rows_affected(), "user")
    }

    async fn list_categories(
        &self,
        filter: &CategoryFilter,
        page: Page,
    ) -> Result<(Vec<Category>, i64), AppError> {
        let name = normalize_filter(&filter.category_name);

        let total = self
            .timed(
                "count_categories",
                sqlx::query_scalar::<_, i64>(
                    "SELECT COUNT(*) FROM categories WHERE ($1::TEXT IS NULL OR name ILIKE '%' || $1 || '%')",
                )
                .bind(&name)
                .fetch_one(&self.pool),
            )
            .await?;

        let categories = self
            .timed(
                "list_categories",
                sqlx::query_as::<_, Category>(
                    r#"
                    SELECT id, name, description, created_at, updated_at
                    FROM categories
                    WHERE ($1::TEXT IS NULL OR name ILIKE '%' || $1 || '%')
                    ORDER BY created_at DESC, id DESC
                    LIMIT $2 OFFSET $3
                    "#,
                )
                .bind(&name)
                .bind(page.limit())
                .bind(page.offset())
                .fetch_all(&self.pool),
            )
            .await?;

        Ok((categories, total))
    }

    async fn insert_category(&self, input: &CategoryInput) -> Result<i64, AppError> {
        let now = Utc::now();
        self.timed(
            "insert_category",
            sqlx::query_scalar::<_, i64>(
                r#"
                INSERT INTO categories (name, description, created_at, updated_at)
                VALUES ($1, $2, $3, $3)
                RETURNING id
                "#,
            )
            .bind(&input.name)
            .bind(&input.description)
            .bind(now)
            .fetch_one(&self.pool),
        )
        .await
    }

    async fn update_category(&self, id: i64, input: &CategoryInput) -> Result<(), AppError> {
        let result = self
            .timed(
                "update_category",
                sqlx::query(
                    "UPDATE categories SET name = $1, description = $2, updated_at = $3 WHERE id = $4",
                )
                .bind(&input.name)
                .bind(&input.description)
                .bind(Utc::now())
                .bind(id)
                .execute(&self.pool),
            )
            .await?;
        expect_affected(result.rows_affected(), "category")
    }

    async fn delete_category(&self, id: i64) -> Result<(), AppError> {
        let result = self
            .timed(
                "delete_category",
                sqlx::query("DELETE FROM categories WHERE id = $1")
                    .bind(id)
                    .execute(&self.pool),
            )
            .await?;
        expect_affected(result.rows_affected(), "category")
    }

    async fn list_products(
        &self,
        filter: &ProductFilter,
        page: Page,
    ) -> Result<(Vec<Product>, i64), AppError> {
        let name = normalize_filter(&filter.product_name);
        let category = normalize_filter(&filter.category_name);
        let status = normalize_filter(&filter.status);

        let count_query = format!(
            r#"
            SELECT COUNT(*)
            FROM products p
            INNER JOIN product_categories pc ON p.id = pc.product_id
            INNER JOIN categories c ON pc.category_id = c.id
            {}
            "#,
            PRODUCT_FILTER
        );
        let total = self
            .timed(
                "count_products",
                sqlx::query_scalar::<_, i64>(&count_query)
                    .bind(&name)
                    .bind(&category)
                    .bind(&status)
                    .fetch_one(&self.pool),
            )
            .await?;

        let list_query = format!(
            "{} {} ORDER BY p.created_at DESC, p.id DESC LIMIT $4 OFFSET $5",
            PRODUCT_SELECT, PRODUCT_FILTER
        );
        let products = self
            .timed(
                "list_products",
                sqlx::query_as::<_, Product>(&list_query)
                    .bind(&name)
                    .bind(&category)
                    .bind(&status)
                    .bind(page.limit())
                    .bind(page.offset())
                    .fetch_all(&self.pool),
            )
            .await?;

        Ok((products, total))
    }

    async fn insert_product(&self, input: &ProductInput) -> Result<i64, AppError> {
        let pool = &self.pool;
        let id = self
            .timed("insert_product", async move {
                let now = Utc::now();
                let mut tx = pool.begin().await?;

                let id = sqlx::query_scalar::<_, i64>(
                    r#"
                    INSERT INTO products (name, description, price, stock_quantity, status, created_at, updated_at)
                    VALUES ($1, $2, $3, $4, $5, $6, $6)
                    RETURNING id
                    "#,
                )
                .bind(&input.name)
                .bind(&input.description)
                .bind(input.price)
                .bind(input.stock_quantity)
                .bind(&input.status)
                .bind(now)
                .fetch_one(&mut tx)
                .await?;

                sqlx::query("INSERT INTO product_categories (product_id, category_id) VALUES ($1, $2)")
                    .bind(id)
                    .bind(input.category_id)
                    .execute(&mut tx)
                    .await?;

                tx.commit().await?;
                Ok::<_, sqlx::Error>(id)
            })
            .await?;

        tracing::info!(product_id = id, category_id = input.category_id, "Product created");
        Ok(id)
    }

    async fn update_product(&self, id: i64, input: &ProductInput) -> Result<(), AppError> {
        let pool = &self.pool;
        let rows = self
            .timed("update_product", async move {
                let mut tx = pool.begin().await?;

                let updated = sqlx::query(
                    r#"
                    UPDATE products
                    SET name = $1, description = $2, price = $3, stock_quantity = $4,
                        status = $5, updated_at = $6
                    WHERE id = $7
                    "#,
                )
                .bind(&input.name)
                .bind(&input.description)
                .bind(input.price)
                .bind(input.stock_quantity)
                .bind(&input.status)
                .bind(Utc::now())
                .bind(id)
                .execute(&mut tx)
                .await?
                .rows_affected();

                // The link row is gone when the old category was deleted
                if updated > 0 {
                    sqlx::query(
                        r#"
                        INSERT INTO product_categories (product_id, category_id)
                        VALUES ($2, $1)
                        ON CONFLICT (product_id) DO UPDATE SET category_id = EXCLUDED.category_id
                        "#,
                    )
                    .bind(input.category_id)
                    .bind(id)
                    .execute(&mut tx)
                    .await?;
                }

                tx.commit().await?;
                Ok::<_, sqlx::Error>(updated)
            })
            .await?;
        expect_affected(rows, "product")
    }

    async fn delete_product(&self, id: i64) -> Result<(), AppError> {
        let result = self
            .timed(
                "delete_product",
                sqlx::query("DELETE FROM products WHERE id = $1")
                    .bind(id)
                    .execute(&self.pool),
            )
            .await?;
        expect_affected(result.rows_affected(), "product")
    }

    async fn reviews_for_product(&self, product_id: i64) -> Result<Vec<Review>, AppError> {
        self.timed(
            "reviews_for_product",
            sqlx::query_as::<_, Review>(
                r#"
                SELECT r.id, r.product_id, r.user_id, u.name AS user_name, p.name AS product_name,
                       r.rating, r.comment, r.created_at
                FROM reviews r
                INNER JOIN products p ON r.product_id = p.id
                INNER JOIN users u ON r.user_id = u.id
                WHERE r.product_id = $1
                ORDER BY r.created_at DESC, r.id DESC
                "#,
            )
            .bind(product_id)
            .fetch_all(&self.pool),
        )
        .await
    }

    async fn insert_review(&self, review: &NewReview) -> Result<i64, AppError> {
        let now = Utc::now();
        self.timed(
            "insert_review",
            sqlx::query_scalar::<_, i64>(
                r#"
                INSERT INTO reviews (product_id, user_id, rating, comment, created_at, updated_at)
                VALUES ($1, $2, $3, $4, $5, $5)
                RETURNING id
                "#,
            )
            .bind(review.product_id)
            .bind(review.user_id)
            .bind(review.rating)
            .bind(&review.comment)
            .bind(now)
            .fetch_one(&self.pool),
        )
        .await
    }

    async fn delete_review(&self, id: i64) -> Result<(), AppError> {
        let result = self
            .timed(
                "delete_review",
                sqlx::query("DELETE FROM reviews WHERE id = $1")
                    .bind(id)
                    .execute(&self.pool),
            )
            .await?;
        expect_affected(result.rows_affected(), "review")
    }

    async fn add_to_wishlist(&self, user_id: i64, product_id: i64) -> Result<(), AppError> {
        self.timed(
            "add_to_wishlist",
            sqlx::query(
                r#"
                INSERT INTO wishlist (user_id, product_id, created_at)
                VALUES ($1, $2, $3)
                ON CONFLICT (user_id, product_id) DO NOTHING
                "#,
            )
            .bind(user_id)
            .bind(product_id)
            .bind(Utc::now())
            .execute(&self.pool),
        )
        .await?;
        Ok(())
    }

    async fn remove_from_wishlist(&self, user_id: i64, product_id: i64) -> Result<(), AppError> {
        let result = self
            .timed(
                "remove_from_wishlist",
                sqlx::query("DELETE FROM wishlist WHERE user_id = $1 AND product_id = $2")
                    .bind(user_id)
                    .bind(product_id)
                    .execute(&self.pool),
            )
            .await?;
        expect_affected(result.rows_affected(), "wishlist entry")
    }

    async fn wishlist(&self, user_id: i64) -> Result<Vec<Product>, AppError> {
        let query = format!(
            "{} INNER JOIN wishlist w ON p.id = w.product_id WHERE w.user_id = $1 ORDER BY w.created_at DESC",
            PRODUCT_SELECT
        );
        self.timed(
            "wishlist",
            sqlx::query_as::<_, Product>(&query)
                .bind(user_id)
                .fetch_all(&self.pool),
        )
        .await
    }
}
