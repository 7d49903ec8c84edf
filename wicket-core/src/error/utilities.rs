use crate::{
    Error,
    error::{StorageError, ValidationError},
};

/// Extension trait for Option types to simplify required field validation
///
/// # Example
///
/// ```rust
/// use wicket_core::error::utilities::RequiredFieldExt;
///
/// let email: Option<String> = Some("a@x.com".to_string());
/// let email = email.require_field("Email").unwrap();
/// assert_eq!(email, "a@x.com");
/// ```
pub trait RequiredFieldExt<T> {
    /// Convert None to a ValidationError::MissingField
    fn require_field(self, field_name: &str) -> Result<T, ValidationError>;
}

impl<T> RequiredFieldExt<T> for Option<T> {
    fn require_field(self, field_name: &str) -> Result<T, ValidationError> {
        self.ok_or_else(|| ValidationError::MissingField(format!("{field_name} is required")))
    }
}

/// Extension trait turning a missing record into [`StorageError::NotFound`]
pub trait FoundExt<T> {
    fn or_not_found(self) -> Result<T, Error>;
}

impl<T> FoundExt<T> for Option<T> {
    fn or_not_found(self) -> Result<T, Error> {
        self.ok_or(Error::Storage(StorageError::NotFound))
    }
}
