use crate::{
    error::ValidationError,
    product::{NewProduct, ProductUpdate},
};
use regex::Regex;
use std::ops::RangeInclusive;
use std::sync::LazyLock;

/// Lazy-loaded email validation regex
///
/// A practical subset of RFC 5322, compiled once and reused.
static EMAIL_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[a-zA-Z0-9._%+-]+@[a-zA-Z0-9.-]+\.[a-zA-Z]{2,}$")
        .expect("Invalid email regex pattern")
});

const MAX_TEXT_LEN: usize = 100;
const PRICE_RANGE: RangeInclusive<u32> = 1..=99_999;
const NEW_STOCK_RANGE: RangeInclusive<u32> = 0..=99_999;
const UPDATED_STOCK_RANGE: RangeInclusive<u32> = 1..=99_999;

/// Validates an email address
///
/// # Examples
///
/// ```rust
/// use wicket_core::validation::validate_email;
///
/// assert!(validate_email("user@example.com").is_ok());
/// assert!(validate_email("invalid-email").is_err());
/// ```
pub fn validate_email(email: &str) -> Result<(), ValidationError> {
    if email.is_empty() {
        return Err(ValidationError::MissingField(
            "Email is required".to_string(),
        ));
    }

    if email.len() > 254 {
        return Err(ValidationError::InvalidEmail(
            "Email is too long".to_string(),
        ));
    }

    if EMAIL_REGEX.is_match(email) {
        Ok(())
    } else {
        Err(ValidationError::InvalidEmail(email.to_string()))
    }
}

/// Validates a password according to security requirements
///
/// # Password Requirements
///
/// - Minimum 8 characters
/// - Maximum 128 characters
/// - Cannot be empty or whitespace only
pub fn validate_password(password: &str) -> Result<(), ValidationError> {
    if password.is_empty() {
        return Err(ValidationError::MissingField(
            "Password is required".to_string(),
        ));
    }

    if password.trim().is_empty() {
        return Err(ValidationError::InvalidPassword(
            "Password cannot be only whitespace".to_string(),
        ));
    }

    if password.len() < 8 {
        return Err(ValidationError::InvalidPassword(
            "Password must be at least 8 characters long".to_string(),
        ));
    }

    if password.len() > 128 {
        return Err(ValidationError::InvalidPassword(
            "Password must be no more than 128 characters long".to_string(),
        ));
    }

    Ok(())
}

/// Validates a user's display name: required, not blank, at most 100 characters.
pub fn validate_name(name: &str) -> Result<(), ValidationError> {
    if name.trim().is_empty() {
        return Err(ValidationError::InvalidName(
            "Name cannot be empty or whitespace only".to_string(),
        ));
    }

    if name.chars().count() > MAX_TEXT_LEN {
        return Err(ValidationError::InvalidName(format!(
            "Name must be no more than {MAX_TEXT_LEN} characters long"
        )));
    }

    Ok(())
}

fn validate_text(label: &str, value: &str) -> Result<(), ValidationError> {
    let len = value.chars().count();
    if len == 0 || len > MAX_TEXT_LEN {
        return Err(ValidationError::InvalidField(format!(
            "{label} must be between 1 and {MAX_TEXT_LEN} characters long"
        )));
    }
    Ok(())
}

fn validate_range(
    label: &str,
    value: u32,
    range: RangeInclusive<u32>,
) -> Result<(), ValidationError> {
    if !range.contains(&value) {
        return Err(ValidationError::InvalidField(format!(
            "{label} must be between {} and {}",
            range.start(),
            range.end()
        )));
    }
    Ok(())
}

/// Validates a product listing before it is created
pub fn validate_new_product(product: &NewProduct) -> Result<(), ValidationError> {
    validate_text("Name", &product.name)?;
    if let Some(description) = &product.description {
        validate_text("Description", description)?;
    }
    validate_range("Price", product.price, PRICE_RANGE)?;
    validate_range("Stock", product.stock, NEW_STOCK_RANGE)
}

/// Validates a partial product update
///
/// Restocking through an update must leave at least one unit; creating a
/// listing with zero stock is allowed.
pub fn validate_product_update(update: &ProductUpdate) -> Result<(), ValidationError> {
    if let Some(description) = &update.description {
        validate_text("Description", description)?;
    }
    if let Some(price) = update.price {
        validate_range("Price", price, PRICE_RANGE)?;
    }
    if let Some(stock) = update.stock {
        validate_range("Stock", stock, UPDATED_STOCK_RANGE)?;
    }
    Ok(())
}
