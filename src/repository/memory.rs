use std::collections::{BTreeMap, BTreeSet};
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::auth::hash_password;
use crate::error::{AppError, CryptoError, DatabaseError};
use crate::models::{
    matches_filter, Category, CategoryFilter, CategoryInput, NewReview, Page, Product,
    ProductFilter, ProductInput, Review, User,
};
use crate::repository::StoreRepository;

pub const FIXTURE_ADMIN_EMAIL: &str = "admin@example.com";
pub const FIXTURE_ADMIN_PASSWORD: &str = "secret";

#[derive(Clone)]
struct ProductRow {
    id: i64,
    name: String,
    description: String,
    price: f64,
    stock_quantity: i32,
    status: String,
    category_id: i64,
    created_at: DateTime<Utc>,
}

#[derive(Clone)]
struct ReviewRow {
    id: i64,
    product_id: i64,
    user_id: i64,
    rating: i32,
    comment: String,
    created_at: DateTime<Utc>,
}

#[derive(Default)]
struct State {
    next_id: i64,
    users: BTreeMap<i64, User>,
    categories: BTreeMap<i64, Category>,
    products: BTreeMap<i64, ProductRow>,
    reviews: BTreeMap<i64, ReviewRow>,
    wishlist: BTreeSet<(i64, i64)>,
}

impl State {
    fn next_id(&mut self) -> i64 {
        self.next_id += 1;
        self.next_id
    }

    /// Mirrors the inner join on categories: a product whose category is gone
    /// is not listed.
    fn product(&self, row: &ProductRow) -> Option<Product> {
        let category = self.categories.get(&row.category_id)?;
        Some(Product {
            id: row.id,
            name: row.name.clone(),
            description: row.description.clone(),
            price: row.price,
            stock_quantity: row.stock_quantity,
            status: row.status.clone(),
            category_id: category.id,
            category_name: category.name.clone(),
            created_at: row.created_at,
        })
    }
}

fn paginate<T>(items: Vec<T>, page: Page) -> (Vec<T>, i64) {
    let total = items.len() as i64;
    let items = items
        .into_iter()
        .skip(page.offset() as usize)
        .take(page.limit() as usize)
        .collect();
    (items, total)
}

fn not_found(what: impl Into<String>) -> AppError {
    DatabaseError::NotFound(what.into()).into()
}

/// Process-local store with the same observable behavior as the Postgres
/// repository, foreign keys and cascades included.
#[derive(Default)]
pub struct InMemoryRepository {
    state: Mutex<State>,
}

impl InMemoryRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Repository holding one admin account, `admin@example.com` / `secret`
    pub fn with_fixtures() -> Result<Self, CryptoError> {
        let repository = Self::new();
        let hash = hash_password(FIXTURE_ADMIN_PASSWORD)?;
        repository.seed_user("Admin", FIXTURE_ADMIN_EMAIL, &hash, true);
        Ok(repository)
    }

    /// Insert a user directly, bypassing registration rules
    pub fn seed_user(&self, name: &str, email: &str, password_hash: &str, is_admin: bool) -> i64 {
        let mut state = self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        let id = state.next_id();
        let now = Utc::now();
        state.users.insert(
            id,
            User {
                id,
                name: name.to_string(),
                email: email.to_string(),
                password_hash: password_hash.to_string(),
                is_admin,
                created_at: now,
                updated_at: now,
            },
        );
        id
    }

    fn state(&self) -> Result<MutexGuard<'_, State>, AppError> {
        self.state
            .lock()
            .map_err(|_| AppError::Internal("in-memory store lock poisoned".to_string()))
    }
}

#[async_trait]
impl StoreRepository for InMemoryRepository {
    async fn user_by_id(&self, id: i64) -> Result<User, AppError> {
        self.state()?
            .users
            .get(&id)
            .cloned()
            .ok_or_else(|| not_found(format!("user {}", id)))
    }

    async fn user_by_email(&self, email: &str) -> Result<Option<User>, AppError> {
        Ok(self
            .state()?
            .users
            .values()
            .find(|u| u.email == email)
            .cloned())
    }

    async fn insert_user(
        &self,
        name: &str,
        email: &str,
        password_hash: &str,
    ) -> Result<i64, AppError> {
        let mut state = self.state()?;
        if state.users.values().any(|u| u.email == email) {
            return Err(DatabaseError::UniqueConstraintViolation("users_email_key".to_string()).into());
        }
        let id = state.next_id();
        let now = Utc::now();
        state.users.insert(
            id,
            User {
                id,
                name: name.to_string(),
                email: email.to_string(),
                password_hash: password_hash.to_string(),
                is_admin: false,
                created_at: now,
                updated_at: now,
            },
        );
        Ok(id)
    }

    async fn update_password(&self, id: i64, password_hash: &str) -> Result<(), AppError> {
        let mut state = self.state()?;
        let user = state.users.get_mut(&id).ok_or_else(|| not_found("user"))?;
        user.password_hash = password_hash.to_string();
        user.updated_at = Utc::now();
        Ok(())
    }

    async fn list_categories(
        &self,
        filter: &CategoryFilter,
        page: Page,
    ) -> Result<(Vec<Category>, i64), AppError> {
        let state = self.state()?;
        let matching: Vec<Category> = state
            .categories
            .values()
            .rev()
            .filter(|c| matches_filter(&c.name, filter.category_name.as_deref()))
            .cloned()
            .collect();
        Ok(paginate(matching, page))
    }

    async fn insert_category(&self, input: &CategoryInput) -> Result<i64, AppError> {
        let mut state = self.state()?;
        let id = state.next_id();
        let now = Utc::now();
        state.categories.insert(
            id,
            Category {
                id,
                name: input.name.clone(),
                description: input.description.clone(),
                created_at: now,
                updated_at: now,
            },
        );
        Ok(id)
    }

    async fn update_category(&self, id: i64, input: &CategoryInput) -> Result<(), AppError> {
        let mut state = self.state()?;
        let category = state.categories.get_mut(&id).ok_or_else(|| not_found("category"))?;
        category.name = input.name.clone();
        category.description = input.description.clone();
        category.updated_at = Utc::now();
        Ok(())
    }

    async fn delete_category(&self, id: i64) -> Result<(), AppError> {
        let mut state = self.state()?;
        state.categories.remove(&id).ok_or_else(|| not_found("category"))?;
        Ok(())
    }

    async fn list_products(
        &self,
        filter: &ProductFilter,
        page: Page,
    ) -> Result<(Vec<Product>, i64), AppError> {
        let state = self.state()?;
        let matching: Vec<Product> = state
            .products
            .values()
            .rev()
            .filter_map(|row| state.product(row))
            .filter(|p| matches_filter(&p.name, filter.product_name.as_deref()))
            .filter(|p| matches_filter(&p.category_name, filter.category_name.as_deref()))
            .filter(|p| matches_filter(&p.status, filter.status.as_deref()))
            .collect();
        Ok(paginate(matching, page))
    }

    async fn insert_product(&self, input: &ProductInput) -> Result<i64, AppError> {
        let mut state = self.state()?;
        if !state.categories.contains_key(&input.category_id) {
            return Err(DatabaseError::ForeignKeyViolation("product_categories_category_id_fkey".to_string()).into());
        }
        let id = state.next_id();
        state.products.insert(
            id,
            ProductRow {
                id,
                name: input.name.clone(),
                description: input.description.clone(),
                price: input.price,
                stock_quantity: input.stock_quantity,
                status: input.status.clone(),
                category_id: input.category_id,
                created_at: Utc::now(),
            },
        );
        Ok(id)
    }

    async fn update_product(&self, id: i64, input: &ProductInput) -> Result<(), AppError> {
        let mut state = self.state()?;
        if !state.products.contains_key(&id) {
            return Err(not_found("product"));
        }
        if !state.categories.contains_key(&input.category_id) {
            return Err(DatabaseError::ForeignKeyViolation("product_categories_category_id_fkey".to_string()).into());
        }
        if let Some(row) = state.products.get_mut(&id) {
            row.name = input.name.clone();
            row.description = input.description.clone();
            row.price = input.price;
            row.stock_quantity = input.stock_quantity;
            row.status = input.status.clone();
            row.category_id = input.category_id;
        }
        Ok(())
    }

    async fn delete_product(&self, id: i64) -> Result<(), AppError> {
        let mut state = self.state()?;
        state.products.remove(&id).ok_or_else(|| not_found("product"))?;
        state.reviews.retain(|_, r| r.product_id != id);
        state.wishlist.retain(|(_, product_id)| *product_id != id);
        Ok(())
    }

    async fn reviews_for_product(&self, product_id: i64) -> Result<Vec<Review>, AppError> {
        let state = self.state()?;
        let product_name = match state.products.get(&product_id) {
            Some(product) => product.name.clone(),
            None => return Ok(Vec::new()),
        };
        Ok(state
            .reviews
            .values()
            .rev()
            .filter(|r| r.product_id == product_id)
            .filter_map(|r| {
                let user = state.users.get(&r.user_id)?;
                Some(Review {
                    id: r.id,
                    product_id: r.product_id,
                    user_id: r.user_id,
                    user_name: user.name.clone(),
                    product_name: product_name.clone(),
                    rating: r.rating,
                    comment: r.comment.clone(),
                    created_at: r.created_at,
                })
            })
            .collect())
    }

    async fn insert_review(&self, review: &NewReview) -> Result<i64, AppError> {
        let mut state = self.state()?;
        if !state.products.contains_key(&review.product_id) {
            return Err(DatabaseError::ForeignKeyViolation("reviews_product_id_fkey".to_string()).into());
        }
        if !state.users.contains_key(&review.user_id) {
            return Err(DatabaseError::ForeignKeyViolation("reviews_user_id_fkey".to_string()).into());
        }
        let id = state.next_id();
        state.reviews.insert(
            id,
            ReviewRow {
                id,
                product_id: review.product_id,
                user_id: review.user_id,
                rating: review.rating,
                comment: review.comment.clone(),
                created_at: Utc::now(),
            },
        );
        Ok(id)
    }

    async fn delete_review(&self, id: i64) -> Result<(), AppError> {
        let mut state = self.state()?;
        state.reviews.remove(&id).ok_or_else(|| not_found("review"))?;
        Ok(())
    }

    async fn add_to_wishlist(&self, user_id: i64, product_id: i64) -> Result<(), AppError> {
        let mut state = self.state()?;
        if !state.products.contains_key(&product_id) {
            return Err(DatabaseError::ForeignKeyViolation("wishlist_product_id_fkey".to_string()).into());
        }
        state.wishlist.insert((user_id, product_id));
        Ok(())
    }

    async fn remove_from_wishlist(&self, user_id: i64, product_id: i64) -> Result<(), AppError> {
        let mut state = self.state()?;
        if !state.wishlist.remove(&(user_id, product_id)) {
            return Err(not_found("wishlist entry"));
        }
        Ok(())
    }

    async fn wishlist(&self, user_id: i64) -> Result<Vec<Product>, AppError> {
        let state = self.state()?;
        Ok(state
            .wishlist
            .iter()
            .filter(|(owner, _)| *owner == user_id)
            .filter_map(|(_, product_id)| state.products.get(product_id))
            .filter_map(|row| state.product(row))
            .collect())
    }
}
