//! Data access for the store.
//!
//! Handlers only see the `StoreRepository` trait. `PostgresRepository` is the
//! production implementation; `InMemoryRepository` keeps everything in
//! process and backs the test suite and local runs without a database.
//!
//! Conventions shared by both implementations:
//! - updating or deleting a row that does not exist is `DatabaseError::NotFound`
//! - name/status filters are case-insensitive substring matches
//! - listings are ordered newest first

mod memory;
mod postgres;

use async_trait::async_trait;

use crate::error::AppError;
use crate::models::{
    Category, CategoryFilter, CategoryInput, NewReview, Page, Product, ProductFilter,
    ProductInput, Review, User,
};

pub use memory::{InMemoryRepository, FIXTURE_ADMIN_EMAIL, FIXTURE_ADMIN_PASSWORD};
pub use postgres::PostgresRepository;

#[async_trait]
pub trait StoreRepository: Send + Sync {
    // Users
    async fn user_by_id(&self, id: i64) -> Result<User, AppError>;
    async fn user_by_email(&self, email: &str) -> Result<Option<User>, AppError>;
    /// `password_hash` must already be a bcrypt digest
    async fn insert_user(
        &self,
        name: &str,
        email: &str,
        password_hash: &str,
    ) -> Result<i64, AppError>;
    async fn update_password(&self, id: i64, password_hash: &str) -> Result<(), AppError>;

    // Categories
    async fn list_categories(
        &self,
        filter: &CategoryFilter,
        page: Page,
    ) -> Result<(Vec<Category>, i64), AppError>;
    async fn insert_category(&self, input: &CategoryInput) -> Result<i64, AppError>;
    async fn update_category(&self, id: i64, input: &CategoryInput) -> Result<(), AppError>;
    async fn delete_category(&self, id: i64) -> Result<(), AppError>;

    // Products
    async fn list_products(
        &self,
        filter: &ProductFilter,
        page: Page,
    ) -> Result<(Vec<Product>, i64), AppError>;
    /// Creates the product and links it to `input.category_id` atomically
    async fn insert_product(&self, input: &ProductInput) -> Result<i64, AppError>;
    async fn update_product(&self, id: i64, input: &ProductInput) -> Result<(), AppError>;
    async fn delete_product(&self, id: i64) -> Result<(), AppError>;

    // Reviews
    async fn reviews_for_product(&self, product_id: i64) -> Result<Vec<Review>, AppError>;
    async fn insert_review(&self, review: &NewReview) -> Result<i64, AppError>;
    async fn delete_review(&self, id: i64) -> Result<(), AppError>;

    // Wishlist
    /// Adding a product twice is a no-op
    async fn add_to_wishlist(&self, user_id: i64, product_id: i64) -> Result<(), AppError>;
    async fn remove_from_wishlist(&self, user_id: i64, product_id: i64) -> Result<(), AppError>;
    async fn wishlist(&self, user_id: i64) -> Result<Vec<Product>, AppError>;
}

/// Empty or whitespace-only filters mean "no filter"
pub(crate) fn normalize_filter(value: &Option<String>) -> Option<String> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}
