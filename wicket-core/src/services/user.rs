use crate::{
    Error, User, UserId,
    error::{AuthError, StorageError, ValidationError, utilities::FoundExt},
    listing::{ListQuery, Page},
    password::PasswordHasher,
    repositories::{PasswordRepository, UserRepository},
    user::NewUser,
    validation::{validate_email, validate_name, validate_password},
};
use chrono::Utc;
use std::sync::Arc;

/// User administration and password management
pub struct UserService<U: UserRepository, P: PasswordRepository, H: PasswordHasher> {
    users: Arc<U>,
    passwords: Arc<P>,
    hasher: Arc<H>,
}

impl<U: UserRepository, P: PasswordRepository, H: PasswordHasher> UserService<U, P, H> {
    pub fn new(users: Arc<U>, passwords: Arc<P>, hasher: Arc<H>) -> Self {
        Self {
            users,
            passwords,
            hasher,
        }
    }

    pub async fn list_users(&self) -> Result<Vec<User>, Error> {
        self.users.list().await
    }

    pub async fn paginated_users(&self, query: &ListQuery) -> Result<Page<User>, Error> {
        let users = self.users.list().await?;
        Ok(query.apply(users)?)
    }

    pub async fn get_user(&self, user_id: &UserId) -> Result<Option<User>, Error> {
        self.users.find_by_id(user_id).await
    }

    pub async fn get_user_by_email(&self, email: &str) -> Result<Option<User>, Error> {
        self.users.find_by_email(email).await
    }

    pub async fn email_is_registered(&self, email: &str) -> Result<bool, Error> {
        Ok(self.users.find_by_email(email).await?.is_some())
    }

    /// Register a user with a password
    ///
    /// Fails with `AuthError::UserAlreadyExists` when the email is taken.
    pub async fn create_user(&self, name: &str, email: &str, password: &str) -> Result<User, Error> {
        validate_name(name)?;
        validate_email(email)?;
        validate_password(password)?;

        if self.email_is_registered(email).await? {
            return Err(AuthError::UserAlreadyExists.into());
        }

        let password_hash = self.hasher.hash(password).await?;
        let user = self
            .users
            .create(NewUser::builder().name(name).email(email).build()?)
            .await?;
        self.passwords
            .set_password_hash(&user.id, &password_hash)
            .await?;

        tracing::info!(user_id = %user.id, "Created user");
        Ok(user)
    }

    pub async fn update_user(&self, user_id: &UserId, name: &str, email: &str) -> Result<User, Error> {
        validate_name(name)?;
        validate_email(email)?;

        let mut user = self
            .users
            .find_by_id(user_id)
            .await?
            .or_not_found()?;

        if user.email != email && self.email_is_registered(email).await? {
            return Err(AuthError::UserAlreadyExists.into());
        }

        user.name = name.to_string();
        user.email = email.to_string();
        user.updated_at = Utc::now();
        self.users.update(&user).await
    }

    pub async fn delete_user(&self, user_id: &UserId) -> Result<(), Error> {
        self.users.delete(user_id).await?;
        self.passwords.remove_password_hash(user_id).await?;
        tracing::info!(%user_id, "Deleted user");
        Ok(())
    }

    /// `false` for an unknown user or a user without a password
    pub async fn check_password(&self, user_id: &UserId, password: &str) -> Result<bool, Error> {
        match self.passwords.get_password_hash(user_id).await? {
            Some(hash) => self.hasher.matches(password, &hash).await,
            None => Ok(false),
        }
    }

    /// Replace a password after proving knowledge of the current one
    pub async fn change_password(
        &self,
        user_id: &UserId,
        old_password: &str,
        new_password: &str,
        confirm_password: &str,
    ) -> Result<(), Error> {
        validate_password(new_password)?;
        if new_password != confirm_password {
            return Err(ValidationError::InvalidPassword(
                "Password confirmation does not match".to_string(),
            )
            .into());
        }

        if self.users.find_by_id(user_id).await?.is_none() {
            return Err(StorageError::NotFound.into());
        }
        if !self.check_password(user_id, old_password).await? {
            return Err(AuthError::InvalidCredentials.into());
        }

        let new_hash = self.hasher.hash(new_password).await?;
        self.passwords.set_password_hash(user_id, &new_hash).await
    }
}
