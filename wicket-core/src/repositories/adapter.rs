//! Adapters exposing one repository of a [`RepositoryProvider`] as a
//! standalone `Arc`-able repository, so services can be generic over a single
//! repository trait.

use crate::{
    Error, Product, ProductId, Session, User, UserId,
    repositories::{
        PasswordRepository, ProductRepository, RepositoryProvider, SessionRepository,
        UserRepository,
    },
    session::SessionToken,
    user::NewUser,
};
use async_trait::async_trait;
use std::sync::Arc;

pub struct UserRepositoryAdapter<R: RepositoryProvider> {
    provider: Arc<R>,
}

impl<R: RepositoryProvider> UserRepositoryAdapter<R> {
    pub fn new(provider: Arc<R>) -> Self {
        Self { provider }
    }
}

#[async_trait]
impl<R: RepositoryProvider> UserRepository for UserRepositoryAdapter<R> {
    async fn create(&self, user: NewUser) -> Result<User, Error> {
        self.provider.user().create(user).await
    }

    async fn find_by_id(&self, id: &UserId) -> Result<Option<User>, Error> {
        self.provider.user().find_by_id(id).await
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, Error> {
        self.provider.user().find_by_email(email).await
    }

    async fn list(&self) -> Result<Vec<User>, Error> {
        self.provider.user().list().await
    }

    async fn update(&self, user: &User) -> Result<User, Error> {
        self.provider.user().update(user).await
    }

    async fn delete(&self, id: &UserId) -> Result<(), Error> {
        self.provider.user().delete(id).await
    }
}

pub struct PasswordRepositoryAdapter<R: RepositoryProvider> {
    provider: Arc<R>,
}

impl<R: RepositoryProvider> PasswordRepositoryAdapter<R> {
    pub fn new(provider: Arc<R>) -> Self {
        Self { provider }
    }
}

#[async_trait]
impl<R: RepositoryProvider> PasswordRepository for PasswordRepositoryAdapter<R> {
    async fn set_password_hash(&self, user_id: &UserId, hash: &str) -> Result<(), Error> {
        self.provider
            .password()
            .set_password_hash(user_id, hash)
            .await
    }

    async fn get_password_hash(&self, user_id: &UserId) -> Result<Option<String>, Error> {
        self.provider.password().get_password_hash(user_id).await
    }

    async fn remove_password_hash(&self, user_id: &UserId) -> Result<(), Error> {
        self.provider.password().remove_password_hash(user_id).await
    }
}

pub struct ProductRepositoryAdapter<R: RepositoryProvider> {
    provider: Arc<R>,
}

impl<R: RepositoryProvider> ProductRepositoryAdapter<R> {
    pub fn new(provider: Arc<R>) -> Self {
        Self { provider }
    }
}

#[async_trait]
impl<R: RepositoryProvider> ProductRepository for ProductRepositoryAdapter<R> {
    async fn create(&self, product: Product) -> Result<Product, Error> {
        self.provider.product().create(product).await
    }

    async fn find_by_id(&self, id: &ProductId) -> Result<Option<Product>, Error> {
        self.provider.product().find_by_id(id).await
    }

    async fn find_by_name(&self, name: &str) -> Result<Option<Product>, Error> {
        self.provider.product().find_by_name(name).await
    }

    async fn list(&self) -> Result<Vec<Product>, Error> {
        self.provider.product().list().await
    }

    async fn update(&self, product: &Product) -> Result<Product, Error> {
        self.provider.product().update(product).await
    }

    async fn delete(&self, id: &ProductId) -> Result<(), Error> {
        self.provider.product().delete(id).await
    }
}

pub struct SessionRepositoryAdapter<R: RepositoryProvider> {
    provider: Arc<R>,
}

impl<R: RepositoryProvider> SessionRepositoryAdapter<R> {
    pub fn new(provider: Arc<R>) -> Self {
        Self { provider }
    }
}

#[async_trait]
impl<R: RepositoryProvider> SessionRepository for SessionRepositoryAdapter<R> {
    async fn create(&self, session: Session) -> Result<Session, Error> {
        self.provider.session().create(session).await
    }

    async fn find_by_token(&self, token: &SessionToken) -> Result<Option<Session>, Error> {
        self.provider.session().find_by_token(token).await
    }

    async fn delete(&self, token: &SessionToken) -> Result<(), Error> {
        self.provider.session().delete(token).await
    }

    async fn delete_by_user_id(&self, user_id: &UserId) -> Result<(), Error> {
        self.provider.session().delete_by_user_id(user_id).await
    }

    async fn cleanup_expired(&self) -> Result<(), Error> {
        self.provider.session().cleanup_expired().await
    }
}
