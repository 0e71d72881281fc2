use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct Category {
    pub id: i64,
    pub name: String,
    pub description: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CategoryInput {
    pub name: String,
    #[serde(default)]
    pub description: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct CategoryFilter {
    pub category_name: Option<String>,
}

/// Product as listed; `category_name` is joined in from its category.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct Product {
    pub id: i64,
    pub name: String,
    pub description: String,
    pub price: f64,
    pub stock_quantity: i32,
    pub status: String,
    pub category_id: i64,
    pub category_name: String,
    pub created_at: DateTime<Utc>,
}

fn default_status() -> String {
    "active".to_string()
}

#[derive(Debug, Clone, Deserialize)]
pub struct ProductInput {
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub price: f64,
    #[serde(default)]
    pub stock_quantity: i32,
    #[serde(default = "default_status")]
    pub status: String,
    pub category_id: i64,
}

#[derive(Debug, Default, Deserialize)]
pub struct ProductFilter {
    pub product_name: Option<String>,
    pub category_name: Option<String>,
    pub status: Option<String>,
}

/// Case-insensitive substring match, the in-memory twin of `ILIKE '%x%'`
pub(crate) fn matches_filter(value: &str, filter: Option<&str>) -> bool {
    match filter.map(str::trim).filter(|f| !f.is_empty()) {
        None => true,
        Some(f) => value.to_lowercase().contains(&f.to_lowercase()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn product_input_defaults() {
        let input: ProductInput =
            serde_json::from_str(r#"{"name":"Phone","price":199.5,"category_id":1}"#).unwrap();
        assert_eq!(input.status, "active");
        assert_eq!(input.stock_quantity, 0);
        assert!(input.description.is_empty());
    }

    #[test]
    fn filter_matching_is_case_insensitive() {
        assert!(matches_filter("Electronics", Some("tron")));
        assert!(matches_filter("Electronics", Some("ELEC")));
        assert!(matches_filter("Electronics", None));
        assert!(matches_filter("Electronics", Some("  ")));
        assert!(!matches_filter("Books", Some("tron")));
    }
}
