//! In-memory repositories built on [`DashMap`]
//!
//! Unique columns (user email, product name) are enforced through a secondary
//! index claimed with the entry API, so two concurrent inserts of the same key
//! cannot both succeed. Listing order is insertion order, tracked by a
//! monotonically increasing sequence number.

use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use chrono::Utc;
use dashmap::{DashMap, mapref::entry::Entry};

use crate::{
    Error, Product, ProductId, Session, User, UserId,
    crypto::hash_token,
    error::{AuthError, StorageError},
    repositories::{
        PasswordRepository, PasswordRepositoryProvider, ProductRepository,
        ProductRepositoryProvider, RepositoryProvider, SessionRepository,
        SessionRepositoryProvider, UserRepository, UserRepositoryProvider,
    },
    session::SessionToken,
    user::NewUser,
};

#[derive(Debug, Clone)]
struct Sequenced<T> {
    seq: u64,
    value: T,
}

fn in_insertion_order<T: Clone>(rows: impl Iterator<Item = Sequenced<T>>) -> Vec<T> {
    let mut rows: Vec<_> = rows.collect();
    rows.sort_by_key(|row| row.seq);
    rows.into_iter().map(|row| row.value).collect()
}

#[derive(Default)]
pub struct MemoryUserRepository {
    users: DashMap<UserId, Sequenced<User>>,
    emails: DashMap<String, UserId>,
    next_seq: AtomicU64,
}

#[async_trait]
impl UserRepository for MemoryUserRepository {
    async fn create(&self, user: NewUser) -> Result<User, Error> {
        match self.emails.entry(user.email.clone()) {
            Entry::Occupied(_) => Err(AuthError::UserAlreadyExists.into()),
            Entry::Vacant(slot) => {
                let user = user.into_user(Utc::now());
                slot.insert(user.id.clone());
                let seq = self.next_seq.fetch_add(1, Ordering::Relaxed);
                self.users.insert(
                    user.id.clone(),
                    Sequenced {
                        seq,
                        value: user.clone(),
                    },
                );
                Ok(user)
            }
        }
    }

    async fn find_by_id(&self, id: &UserId) -> Result<Option<User>, Error> {
        Ok(self.users.get(id).map(|row| row.value.clone()))
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, Error> {
        let Some(id) = self.emails.get(email).map(|id| id.clone()) else {
            return Ok(None);
        };
        self.find_by_id(&id).await
    }

    async fn list(&self) -> Result<Vec<User>, Error> {
        Ok(in_insertion_order(
            self.users.iter().map(|row| row.value().clone()),
        ))
    }

    async fn update(&self, user: &User) -> Result<User, Error> {
        let current_email = self
            .users
            .get(&user.id)
            .map(|row| row.value.email.clone())
            .ok_or(StorageError::NotFound)?;

        if current_email != user.email {
            match self.emails.entry(user.email.clone()) {
                Entry::Occupied(_) => return Err(AuthError::UserAlreadyExists.into()),
                Entry::Vacant(slot) => {
                    slot.insert(user.id.clone());
                }
            }
            self.emails.remove(&current_email);
        }

        let mut row = self.users.get_mut(&user.id).ok_or(StorageError::NotFound)?;
        row.value = user.clone();
        Ok(user.clone())
    }

    async fn delete(&self, id: &UserId) -> Result<(), Error> {
        let (_, row) = self.users.remove(id).ok_or(StorageError::NotFound)?;
        self.emails.remove(&row.value.email);
        Ok(())
    }
}

#[derive(Default)]
pub struct MemoryPasswordRepository {
    hashes: DashMap<UserId, String>,
}

#[async_trait]
impl PasswordRepository for MemoryPasswordRepository {
    async fn set_password_hash(&self, user_id: &UserId, hash: &str) -> Result<(), Error> {
        self.hashes.insert(user_id.clone(), hash.to_string());
        Ok(())
    }

    async fn get_password_hash(&self, user_id: &UserId) -> Result<Option<String>, Error> {
        Ok(self.hashes.get(user_id).map(|hash| hash.clone()))
    }

    async fn remove_password_hash(&self, user_id: &UserId) -> Result<(), Error> {
        self.hashes.remove(user_id);
        Ok(())
    }
}

#[derive(Default)]
pub struct MemoryProductRepository {
    products: DashMap<ProductId, Sequenced<Product>>,
    names: DashMap<String, ProductId>,
    next_seq: AtomicU64,
}

#[async_trait]
impl ProductRepository for MemoryProductRepository {
    async fn create(&self, product: Product) -> Result<Product, Error> {
        match self.names.entry(product.name.clone()) {
            Entry::Occupied(_) => Err(StorageError::Constraint(
                "Product name is already registered".to_string(),
            )
            .into()),
            Entry::Vacant(slot) => {
                slot.insert(product.id.clone());
                let seq = self.next_seq.fetch_add(1, Ordering::Relaxed);
                self.products.insert(
                    product.id.clone(),
                    Sequenced {
                        seq,
                        value: product.clone(),
                    },
                );
                Ok(product)
            }
        }
    }

    async fn find_by_id(&self, id: &ProductId) -> Result<Option<Product>, Error> {
        Ok(self.products.get(id).map(|row| row.value.clone()))
    }

    async fn find_by_name(&self, name: &str) -> Result<Option<Product>, Error> {
        let Some(id) = self.names.get(name).map(|id| id.clone()) else {
            return Ok(None);
        };
        self.find_by_id(&id).await
    }

    async fn list(&self) -> Result<Vec<Product>, Error> {
        Ok(in_insertion_order(
            self.products.iter().map(|row| row.value().clone()),
        ))
    }

    async fn update(&self, product: &Product) -> Result<Product, Error> {
        let mut row = self
            .products
            .get_mut(&product.id)
            .ok_or(StorageError::NotFound)?;
        if row.value.name != product.name {
            return Err(StorageError::Constraint("Product name cannot change".to_string()).into());
        }
        row.value = product.clone();
        Ok(product.clone())
    }

    async fn delete(&self, id: &ProductId) -> Result<(), Error> {
        let (_, row) = self.products.remove(id).ok_or(StorageError::NotFound)?;
        self.names.remove(&row.value.name);
        Ok(())
    }
}

/// Sessions keyed by the SHA256 digest of their token
#[derive(Default)]
pub struct MemorySessionRepository {
    sessions: DashMap<String, Session>,
}

impl MemorySessionRepository {
    /// Number of stored sessions, expired ones included
    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}

#[async_trait]
impl SessionRepository for MemorySessionRepository {
    async fn create(&self, session: Session) -> Result<Session, Error> {
        self.sessions
            .insert(hash_token(session.token.as_str()), session.clone());
        Ok(session)
    }

    async fn find_by_token(&self, token: &SessionToken) -> Result<Option<Session>, Error> {
        Ok(self
            .sessions
            .get(&hash_token(token.as_str()))
            .map(|session| session.clone()))
    }

    async fn delete(&self, token: &SessionToken) -> Result<(), Error> {
        self.sessions.remove(&hash_token(token.as_str()));
        Ok(())
    }

    async fn delete_by_user_id(&self, user_id: &UserId) -> Result<(), Error> {
        self.sessions.retain(|_, session| &session.user_id != user_id);
        Ok(())
    }

    async fn cleanup_expired(&self) -> Result<(), Error> {
        let now = Utc::now();
        self.sessions.retain(|_, session| !session.is_expired_at(now));
        Ok(())
    }
}

/// A complete [`RepositoryProvider`] held in process memory
#[derive(Default)]
pub struct MemoryRepositoryProvider {
    users: MemoryUserRepository,
    passwords: MemoryPasswordRepository,
    products: MemoryProductRepository,
    sessions: MemorySessionRepository,
}

impl MemoryRepositoryProvider {
    pub fn new() -> Self {
        Self::default()
    }
}

impl UserRepositoryProvider for MemoryRepositoryProvider {
    type UserRepo = MemoryUserRepository;

    fn user(&self) -> &Self::UserRepo {
        &self.users
    }
}

impl PasswordRepositoryProvider for MemoryRepositoryProvider {
    type PasswordRepo = MemoryPasswordRepository;

    fn password(&self) -> &Self::PasswordRepo {
        &self.passwords
    }
}

impl ProductRepositoryProvider for MemoryRepositoryProvider {
    type ProductRepo = MemoryProductRepository;

    fn product(&self) -> &Self::ProductRepo {
        &self.products
    }
}

impl SessionRepositoryProvider for MemoryRepositoryProvider {
    type SessionRepo = MemorySessionRepository;

    fn session(&self) -> &Self::SessionRepo {
        &self.sessions
    }
}

#[async_trait]
impl RepositoryProvider for MemoryRepositoryProvider {
    async fn health_check(&self) -> Result<(), Error> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use chrono::Duration;

    use super::*;
    use crate::{
        product::NewProduct,
        repositories::{AccountLookup, SessionRepositoryAdapter, UserAccountLookup},
        session::{OpaqueSessionProvider, SessionProvider},
    };

    fn new_user(name: &str, email: &str) -> NewUser {
        NewUser::builder().name(name).email(email).build().unwrap()
    }

    fn new_product(name: &str) -> Product {
        NewProduct {
            name: name.to_string(),
            description: None,
            price: 1000,
            stock: 1,
        }
        .into_product(ProductId::new_random(), Utc::now())
    }

    #[tokio::test]
    async fn test_user_email_is_unique() {
        let repo = MemoryUserRepository::default();
        repo.create(new_user("Ayu", "a@x.com")).await.unwrap();

        let err = repo.create(new_user("Other", "a@x.com")).await.unwrap_err();
        assert!(matches!(err, Error::Auth(AuthError::UserAlreadyExists)));
    }

    #[tokio::test]
    async fn test_user_list_keeps_insertion_order() {
        let repo = MemoryUserRepository::default();
        for email in ["c@x.com", "a@x.com", "b@x.com"] {
            repo.create(new_user("U", email)).await.unwrap();
        }

        let emails: Vec<_> = repo
            .list()
            .await
            .unwrap()
            .into_iter()
            .map(|u| u.email)
            .collect();
        assert_eq!(emails, ["c@x.com", "a@x.com", "b@x.com"]);
    }

    #[tokio::test]
    async fn test_user_update_moves_email_index() {
        let repo = MemoryUserRepository::default();
        let mut ayu = repo.create(new_user("Ayu", "a@x.com")).await.unwrap();
        repo.create(new_user("Budi", "b@x.com")).await.unwrap();

        ayu.email = "b@x.com".to_string();
        assert!(repo.update(&ayu).await.is_err());

        ayu.email = "ayu@x.com".to_string();
        repo.update(&ayu).await.unwrap();
        assert!(repo.find_by_email("a@x.com").await.unwrap().is_none());
        assert_eq!(
            repo.find_by_email("ayu@x.com").await.unwrap().unwrap().id,
            ayu.id
        );

        // The freed address can be claimed again
        repo.create(new_user("New", "a@x.com")).await.unwrap();
    }

    #[tokio::test]
    async fn test_user_delete_frees_email() {
        let repo = MemoryUserRepository::default();
        let user = repo.create(new_user("Ayu", "a@x.com")).await.unwrap();

        repo.delete(&user.id).await.unwrap();
        assert!(repo.find_by_id(&user.id).await.unwrap().is_none());
        assert!(matches!(
            repo.delete(&user.id).await,
            Err(Error::Storage(StorageError::NotFound))
        ));
        repo.create(new_user("Ayu", "a@x.com")).await.unwrap();
    }

    #[tokio::test]
    async fn test_product_name_is_unique() {
        let repo = MemoryProductRepository::default();
        repo.create(new_product("Kopi")).await.unwrap();

        let err = repo.create(new_product("Kopi")).await.unwrap_err();
        assert_eq!(
            err.to_string(),
            "Storage error: Constraint violation: Product name is already registered"
        );
        assert!(repo.find_by_name("Kopi").await.unwrap().is_some());
        assert!(repo.find_by_name("Teh").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_account_lookup_requires_password_hash() {
        let storage = Arc::new(MemoryRepositoryProvider::new());
        let lookup = UserAccountLookup::new(
            Arc::new(crate::repositories::UserRepositoryAdapter::new(storage.clone())),
            Arc::new(crate::repositories::PasswordRepositoryAdapter::new(
                storage.clone(),
            )),
        );

        let user = storage.user().create(new_user("Ayu", "a@x.com")).await.unwrap();
        assert!(lookup.find_account("a@x.com").await.unwrap().is_none());

        storage
            .password()
            .set_password_hash(&user.id, "$argon2id$stub")
            .await
            .unwrap();
        let account = lookup.find_account("a@x.com").await.unwrap().unwrap();
        assert_eq!(account.user.id, user.id);
        assert_eq!(account.password_hash, "$argon2id$stub");

        assert!(lookup.find_account("nobody@x.com").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_opaque_sessions_are_stored_by_digest() {
        let storage = Arc::new(MemoryRepositoryProvider::new());
        let provider = OpaqueSessionProvider::new(Arc::new(SessionRepositoryAdapter::new(
            storage.clone(),
        )));
        let user_id = UserId::new_random();

        let session = provider
            .create_session(&user_id, None, None, Duration::hours(1))
            .await
            .unwrap();
        assert!(
            storage
                .session()
                .sessions
                .contains_key(&hash_token(session.token.as_str()))
        );
        assert!(
            !storage
                .session()
                .sessions
                .contains_key(session.token.as_str())
        );

        let found = provider.get_session(&session.token).await.unwrap();
        assert_eq!(found.user_id, user_id);

        provider.delete_sessions_for_user(&user_id).await.unwrap();
        assert!(matches!(
            provider.get_session(&session.token).await,
            Err(Error::Session(crate::error::SessionError::NotFound))
        ));
    }

    #[tokio::test]
    async fn test_expired_opaque_session_is_rejected_and_dropped() {
        let storage = Arc::new(MemoryRepositoryProvider::new());
        let provider = OpaqueSessionProvider::new(Arc::new(SessionRepositoryAdapter::new(
            storage.clone(),
        )));

        let session = provider
            .create_session(&UserId::new_random(), None, None, -Duration::minutes(1))
            .await
            .unwrap();

        assert!(matches!(
            provider.get_session(&session.token).await,
            Err(Error::Session(crate::error::SessionError::Expired))
        ));
        assert!(storage.session().sessions.is_empty());
    }

    #[tokio::test]
    async fn test_cleanup_expired_keeps_live_sessions() {
        let repo = MemorySessionRepository::default();
        let live = Session::builder()
            .user_id(UserId::new_random())
            .expires_at(Utc::now() + Duration::hours(1))
            .build()
            .unwrap();
        let stale = Session::builder()
            .user_id(UserId::new_random())
            .expires_at(Utc::now() - Duration::hours(1))
            .build()
            .unwrap();
        repo.create(live.clone()).await.unwrap();
        repo.create(stale.clone()).await.unwrap();

        repo.cleanup_expired().await.unwrap();
        assert!(repo.find_by_token(&live.token).await.unwrap().is_some());
        assert!(repo.find_by_token(&stale.token).await.unwrap().is_none());
    }
}
