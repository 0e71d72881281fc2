mod auth;
mod categories;
mod health_check;
mod products;
mod reviews;
mod wishlist;

pub use auth::{authenticate, change_password, current_user, refresh, register, REFRESH_COOKIE};
pub use categories::{create_category, delete_category, list_categories, update_category};
pub use health_check::health_check;
pub use products::{create_product, delete_product, list_products, update_product};
pub use reviews::{create_review, delete_review, product_reviews};
pub use wishlist::{add_to_wishlist, get_wishlist, remove_from_wishlist};
