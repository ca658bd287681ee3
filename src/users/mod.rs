use std::collections::HashMap;
use std::sync::Mutex;

use argon2::password_hash::rand_core::OsRng;
use argon2::password_hash::SaltString;
use argon2::{Argon2, PasswordHash, PasswordHasher, PasswordVerifier};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Clone)]
pub struct User {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub password_hash: String,
    pub created_at: DateTime<Utc>,
}

/// Identity fields exposed over the wire; never includes the password hash.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PublicUser {
    pub id: Uuid,
    pub name: String,
    pub email: String,
}

impl From<&User> for PublicUser {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            name: user.name.clone(),
            email: user.email.clone(),
        }
    }
}

#[derive(Debug, Error)]
pub enum UserStoreError {
    #[error("email {0} is already in use")]
    EmailTaken(String),
    #[error("invalid email or password")]
    InvalidCredentials,
    #[error("password hashing failed: {0}")]
    Hash(String),
}

/// In-memory account registry with argon2 password hashing.
pub struct MemoryUserStore {
    by_id: Mutex<HashMap<Uuid, User>>,
    id_by_email: Mutex<HashMap<String, Uuid>>,
}

impl MemoryUserStore {
    pub fn new() -> Self {
        Self {
            by_id: Mutex::new(HashMap::new()),
            id_by_email: Mutex::new(HashMap::new()),
        }
    }

    pub fn register(&self, name: &str, email: &str, password: &str) -> Result<PublicUser, UserStoreError> {
        let email = email.trim().to_lowercase();
        let mut ids = self.id_by_email.lock().unwrap();
        if ids.contains_key(&email) {
            return Err(UserStoreError::EmailTaken(email));
        }

        let user = User {
            id: Uuid::new_v4(),
            name: name.trim().to_string(),
            email: email.clone(),
            password_hash: hash_password(password)?,
            created_at: Utc::now(),
        };
        let public = PublicUser::from(&user);

        ids.insert(email, user.id);
        self.by_id.lock().unwrap().insert(user.id, user);
        Ok(public)
    }

    pub fn verify(&self, email: &str, password: &str) -> Result<User, UserStoreError> {
        let email = email.trim().to_lowercase();
        let id = *self
            .id_by_email
            .lock()
            .unwrap()
            .get(&email)
            .ok_or(UserStoreError::InvalidCredentials)?;
        let user = self
            .by_id
            .lock()
            .unwrap()
            .get(&id)
            .cloned()
            .ok_or(UserStoreError::InvalidCredentials)?;

        if verify_password(password, &user.password_hash)? {
            Ok(user)
        } else {
            Err(UserStoreError::InvalidCredentials)
        }
    }

    pub fn get(&self, id: Uuid) -> Option<User> {
        self.by_id.lock().unwrap().get(&id).cloned()
    }
}

impl Default for MemoryUserStore {
    fn default() -> Self {
        Self::new()
    }
}

fn hash_password(password: &str) -> Result<String, UserStoreError> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|h| h.to_string())
        .map_err(|e| UserStoreError::Hash(e.to_string()))
}

fn verify_password(password: &str, password_hash: &str) -> Result<bool, UserStoreError> {
    let parsed = PasswordHash::new(password_hash).map_err(|e| UserStoreError::Hash(e.to_string()))?;
    match Argon2::default().verify_password(password.as_bytes(), &parsed) {
        Ok(_) => Ok(true),
        Err(argon2::password_hash::Error::Password) => Ok(false),
        Err(e) => Err(UserStoreError::Hash(e.to_string())),
    }
}
