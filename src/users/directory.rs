use std::sync::Arc;

use lazy_static::lazy_static;
use regex::Regex;
use tracing::{info, warn};
use uuid::Uuid;

use super::repo::{UserStore, UserStoreError};
use super::repo_types::{NewUserRecord, User, UserPatch};
use crate::auth::password::PasswordHasher;
use crate::error::AppError;

pub const EMAIL_TAKEN: &str = "Email already registered";

pub(crate) fn is_valid_email(email: &str) -> bool {
    lazy_static! {
        static ref EMAIL_RE: Regex = Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap();
    }
    EMAIL_RE.is_match(email)
}

pub(crate) fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// Registration input. `password` is plaintext.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub name: String,
    pub email: String,
    pub password: String,
}

/// Profile mutation. `password` is plaintext; `None` leaves a field alone.
#[derive(Debug, Clone, Default)]
pub struct UserChanges {
    pub name: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
}

/// Sole owner of user records. All password hashing on the write path goes
/// through [`UserDirectory::seal`].
#[derive(Clone)]
pub struct UserDirectory {
    store: Arc<dyn UserStore>,
    hasher: PasswordHasher,
}

impl UserDirectory {
    pub fn new(store: Arc<dyn UserStore>, hasher: PasswordHasher) -> Self {
        Self { store, hasher }
    }

    pub async fn find_by_email(&self, email: &str) -> Result<Option<User>, AppError> {
        Ok(self.store.find_by_email(&normalize_email(email)).await?)
    }

    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, AppError> {
        Ok(self.store.find_by_id(id).await?)
    }

    pub async fn create(&self, new: NewUser) -> Result<User, AppError> {
        let record = NewUserRecord {
            name: new.name.trim().to_string(),
            email: normalize_email(&new.email),
            password_hash: self.seal(&new.password)?,
        };
        let user = self.store.insert(record).await.map_err(map_store_error)?;
        info!(user_id = %user.id, "user created");
        Ok(user)
    }

    /// Persist the supplied fields. Changing the email re-checks uniqueness.
    pub async fn save(&self, id: Uuid, changes: UserChanges) -> Result<User, AppError> {
        let patch = UserPatch {
            name: changes.name.map(|n| n.trim().to_string()),
            email: changes.email.as_deref().map(normalize_email),
            password_hash: changes.password.as_deref().map(|p| self.seal(p)).transpose()?,
        };
        self.store
            .update(id, patch)
            .await
            .map_err(map_store_error)?
            .ok_or_else(|| AppError::NotFound("User not found".into()))
    }

    pub fn compare_password(&self, user: &User, plain: &str) -> bool {
        self.hasher.verify(plain, &user.password_hash)
    }

    /// Same cost as [`Self::compare_password`], for lookups that found nobody.
    pub fn compare_password_absent(&self, plain: &str) -> bool {
        self.hasher.verify_dummy(plain)
    }

    fn seal(&self, plain: &str) -> Result<String, AppError> {
        Ok(self.hasher.hash(plain)?)
    }
}

fn map_store_error(e: UserStoreError) -> AppError {
    match e {
        UserStoreError::EmailTaken => {
            warn!("email already registered");
            AppError::Conflict(EMAIL_TAKEN.into())
        }
        UserStoreError::Other(e) => AppError::Internal(e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::password::cheap_config;
    use crate::users::repo::MemoryUserStore;

    fn directory() -> UserDirectory {
        UserDirectory::new(
            Arc::new(MemoryUserStore::new()),
            PasswordHasher::new(&cheap_config()).unwrap(),
        )
    }

    fn new_user(email: &str) -> NewUser {
        NewUser {
            name: "Grace".into(),
            email: email.into(),
            password: "hunter2hunter2".into(),
        }
    }

    #[test]
    fn email_validation() {
        assert!(is_valid_email("a@b.co"));
        assert!(!is_valid_email("a@b"));
        assert!(!is_valid_email("no at sign.com"));
        assert_eq!(normalize_email("  Mixed@Case.COM "), "mixed@case.com");
    }

    #[tokio::test]
    async fn create_hashes_and_normalizes() {
        let dir = directory();
        let user = dir.create(new_user("Grace@Example.com")).await.unwrap();
        assert_eq!(user.email, "grace@example.com");
        assert_ne!(user.password_hash, "hunter2hunter2");
        assert!(dir.compare_password(&user, "hunter2hunter2"));
        assert!(!dir.compare_password(&user, "hunter3"));

        let found = dir.find_by_email("GRACE@example.com").await.unwrap().unwrap();
        assert_eq!(found.id, user.id);
    }

    #[tokio::test]
    async fn create_duplicate_is_conflict() {
        let dir = directory();
        dir.create(new_user("dup@example.com")).await.unwrap();
        let err = dir.create(new_user("DUP@example.com")).await.unwrap_err();
        assert!(matches!(err, AppError::Conflict(ref m) if m == EMAIL_TAKEN));
    }

    #[tokio::test]
    async fn save_replaces_password_hash() {
        let dir = directory();
        let user = dir.create(new_user("pw@example.com")).await.unwrap();
        let saved = dir
            .save(
                user.id,
                UserChanges {
                    password: Some("brand-new-secret".into()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_ne!(saved.password_hash, user.password_hash);
        assert!(dir.compare_password(&saved, "brand-new-secret"));
        assert!(!dir.compare_password(&saved, "hunter2hunter2"));
    }

    #[tokio::test]
    async fn save_to_taken_email_is_conflict() {
        let dir = directory();
        let a = dir.create(new_user("a@example.com")).await.unwrap();
        dir.create(new_user("b@example.com")).await.unwrap();
        let err = dir
            .save(
                a.id,
                UserChanges {
                    email: Some("B@example.com".into()),
                    ..Default::default()
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Conflict(_)));
    }

    #[tokio::test]
    async fn save_unknown_user_is_not_found() {
        let dir = directory();
        let err = dir.save(Uuid::new_v4(), UserChanges::default()).await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }
}
