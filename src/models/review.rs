use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct Review {
    pub id: i64,
    pub product_id: i64,
    pub user_id: i64,
    pub user_name: String,
    pub product_name: String,
    pub rating: i32,
    pub comment: String,
    pub created_at: DateTime<Utc>,
}

/// Review body; product and author come from the path and the token
#[derive(Debug, Clone, Deserialize)]
pub struct ReviewInput {
    pub rating: i32,
    #[serde(default)]
    pub comment: String,
}

#[derive(Debug, Clone)]
pub struct NewReview {
    pub product_id: i64,
    pub user_id: i64,
    pub rating: i32,
    pub comment: String,
}

#[derive(Debug, Deserialize)]
pub struct WishlistRequest {
    pub product_id: i64,
}
