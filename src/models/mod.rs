/// Store domain types shared by routes and repositories

mod catalog;
mod pagination;
mod review;
mod user;

pub use catalog::{Category, CategoryFilter, CategoryInput, Product, ProductFilter, ProductInput};
pub(crate) use catalog::matches_filter;
pub use pagination::{Page, PageQuery, Paginated, DEFAULT_PAGE_SIZE, MAX_PAGE_SIZE};
pub use review::{NewReview, Review, ReviewInput, WishlistRequest};
pub use user::{Credentials, NewUser, PasswordChange, User};
