/// Input validators for accounts, catalog entries and reviews
///
/// Each validator returns the cleaned value (trimmed where it makes sense)
/// or a `ValidationError` naming the offending field.

use lazy_static::lazy_static;
use regex::Regex;

use crate::auth::MAX_PASSWORD_BYTES;
use crate::error::ValidationError;
use crate::models::{CategoryInput, ProductInput, ReviewInput};

const MAX_EMAIL_LENGTH: usize = 254; // RFC 5321
const MIN_EMAIL_LENGTH: usize = 5;
const MAX_NAME_LENGTH: usize = 256;
const MIN_PASSWORD_LENGTH: usize = 8;
const MAX_DESCRIPTION_LENGTH: usize = 4000;
const MAX_STATUS_LENGTH: usize = 32;
pub const MAX_COMMENT_LENGTH: usize = 2000;
pub const MIN_RATING: i32 = 1;
pub const MAX_RATING: i32 = 5;

lazy_static! {
    // RFC 5322 simplified email regex (practical validation)
    static ref EMAIL_REGEX: Regex = Regex::new(
        r"^[a-zA-Z0-9.!#$%&'*+/=?^_`{|}~-]+@[a-zA-Z0-9](?:[a-zA-Z0-9-]{0,61}[a-zA-Z0-9])?(?:\.[a-zA-Z0-9](?:[a-zA-Z0-9-]{0,61}[a-zA-Z0-9])?)*$"
    ).unwrap();
}

/// Validates an email address and returns it trimmed
pub fn is_valid_email(email: &str) -> Result<String, ValidationError> {
    let trimmed = email.trim();

    if trimmed.is_empty() {
        return Err(ValidationError::EmptyField("email".into()));
    }
    if trimmed.len() < MIN_EMAIL_LENGTH {
        return Err(ValidationError::TooShort("email".into(), MIN_EMAIL_LENGTH));
    }
    if trimmed.len() > MAX_EMAIL_LENGTH {
        return Err(ValidationError::TooLong("email".into(), MAX_EMAIL_LENGTH));
    }
    if !EMAIL_REGEX.is_match(trimmed) {
        return Err(ValidationError::InvalidFormat("email".into()));
    }
    // local part is capped at 64 octets
    if trimmed.split('@').next().map_or(0, str::len) > 64 {
        return Err(ValidationError::SuspiciousContent("email".into()));
    }

    Ok(trimmed.to_string())
}

/// Validates a display name (users, categories, products)
pub fn is_valid_name(field: &str, name: &str) -> Result<String, ValidationError> {
    let trimmed = name.trim();

    if trimmed.is_empty() {
        return Err(ValidationError::EmptyField(field.into()));
    }
    if trimmed.chars().count() > MAX_NAME_LENGTH {
        return Err(ValidationError::TooLong(field.into(), MAX_NAME_LENGTH));
    }
    if trimmed.chars().any(char::is_control) {
        return Err(ValidationError::SuspiciousContent(field.into()));
    }

    Ok(trimmed.to_string())
}

/// Passwords are checked in bytes: bcrypt only reads the first 72.
pub fn validate_new_password(password: &str) -> Result<(), ValidationError> {
    if password.len() < MIN_PASSWORD_LENGTH {
        return Err(ValidationError::TooShort("password".into(), MIN_PASSWORD_LENGTH));
    }
    if password.len() > MAX_PASSWORD_BYTES {
        return Err(ValidationError::TooLong("password".into(), MAX_PASSWORD_BYTES));
    }
    if password.contains('\0') {
        return Err(ValidationError::SuspiciousContent("password".into()));
    }
    Ok(())
}

fn check_description(description: &str) -> Result<(), ValidationError> {
    if description.chars().count() > MAX_DESCRIPTION_LENGTH {
        return Err(ValidationError::TooLong("description".into(), MAX_DESCRIPTION_LENGTH));
    }
    Ok(())
}

pub fn validate_category(input: CategoryInput) -> Result<CategoryInput, ValidationError> {
    let name = is_valid_name("name", &input.name)?;
    check_description(&input.description)?;
    Ok(CategoryInput {
        name,
        description: input.description.trim().to_string(),
    })
}

pub fn validate_product(input: ProductInput) -> Result<ProductInput, ValidationError> {
    let name = is_valid_name("name", &input.name)?;
    check_description(&input.description)?;

    if !input.price.is_finite() || input.price < 0.0 {
        return Err(ValidationError::OutOfRange(
            "price must be a non-negative number".into(),
        ));
    }
    if input.stock_quantity < 0 {
        return Err(ValidationError::OutOfRange(
            "stock_quantity must not be negative".into(),
        ));
    }

    let status = input.status.trim().to_string();
    if status.is_empty() {
        return Err(ValidationError::EmptyField("status".into()));
    }
    if status.len() > MAX_STATUS_LENGTH {
        return Err(ValidationError::TooLong("status".into(), MAX_STATUS_LENGTH));
    }

    Ok(ProductInput {
        name,
        description: input.description.trim().to_string(),
        status,
        ..input
    })
}

pub fn validate_review(input: ReviewInput) -> Result<ReviewInput, ValidationError> {
    if !(MIN_RATING..=MAX_RATING).contains(&input.rating) {
        return Err(ValidationError::OutOfRange(format!(
            "rating must be between {} and {}",
            MIN_RATING, MAX_RATING
        )));
    }
    let comment = input.comment.trim().to_string();
    if comment.chars().count() > MAX_COMMENT_LENGTH {
        return Err(ValidationError::TooLong("comment".into(), MAX_COMMENT_LENGTH));
    }
    Ok(ReviewInput { comment, ..input })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn product(price: f64, stock_quantity: i32) -> ProductInput {
        ProductInput {
            name: "  Phone ".to_string(),
            description: String::new(),
            price,
            stock_quantity,
            status: "active".to_string(),
            category_id: 1,
        }
    }

    #[test]
    fn test_valid_email() {
        assert!(is_valid_email("user@example.com").is_ok());
        assert!(is_valid_email("test.email@domain.co.uk").is_ok());
        assert!(is_valid_email("user+tag@example.com").is_ok());
        assert_eq!(is_valid_email("  admin@example.com ").unwrap(), "admin@example.com");
    }

    #[test]
    fn test_invalid_email_format() {
        assert!(is_valid_email("invalid").is_err());
        assert!(is_valid_email("user@").is_err());
        assert!(is_valid_email("@example.com").is_err());
        assert!(is_valid_email("user@@example.com").is_err());
    }

    #[test]
    fn test_email_length_limits() {
        let too_long = format!("{}@example.com", "a".repeat(250));
        assert!(is_valid_email(&too_long).is_err());

        let long_local = format!("{}@example.com", "a".repeat(65));
        assert!(is_valid_email(&long_local).is_err());

        assert!(is_valid_email("a@b").is_err());
    }

    #[test]
    fn test_valid_name() {
        assert!(is_valid_name("name", "John Doe").is_ok());
        assert!(is_valid_name("name", "O'Brien").is_ok());
        assert!(is_valid_name("name", "Ünïcödé").is_ok());
    }

    #[test]
    fn test_name_limits() {
        assert!(is_valid_name("name", &"é".repeat(256)).is_ok());
        assert!(is_valid_name("name", &"a".repeat(257)).is_err());
        assert!(is_valid_name("name", "   ").is_err());
        assert!(is_valid_name("name", "Name\0with\0null").is_err());
        assert!(is_valid_name("name", "Tab\there").is_err());
    }

    #[test]
    fn test_password_bounds() {
        assert!(validate_new_password("short").is_err());
        assert!(validate_new_password("long enough").is_ok());
        assert!(validate_new_password(&"p".repeat(72)).is_ok());
        assert!(validate_new_password(&"p".repeat(73)).is_err());
        assert!(validate_new_password("password\0").is_err());
    }

    #[test]
    fn test_product_rules() {
        let cleaned = validate_product(product(0.0, 0)).unwrap();
        assert_eq!(cleaned.name, "Phone");

        assert!(validate_product(product(-0.01, 1)).is_err());
        assert!(validate_product(product(f64::NAN, 1)).is_err());
        assert!(validate_product(product(10.0, -1)).is_err());
    }

    #[test]
    fn test_category_requires_name() {
        let input = CategoryInput {
            name: " ".to_string(),
            description: String::new(),
        };
        assert!(matches!(validate_category(input), Err(ValidationError::EmptyField(_))));
    }

    #[test]
    fn test_review_rating_range() {
        for rating in [0, 6, -1] {
            let input = ReviewInput { rating, comment: String::new() };
            assert!(validate_review(input).is_err(), "rating {} accepted", rating);
        }
        let input = ReviewInput { rating: 5, comment: " great ".to_string() };
        assert_eq!(validate_review(input).unwrap().comment, "great");

        let input = ReviewInput { rating: 3, comment: "x".repeat(2001) };
        assert!(validate_review(input).is_err());
    }
}
