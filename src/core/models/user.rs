//! User accounts and password digests

use crate::core::iam::{Principal, Role};
use crate::core::ids::RecordId;
use crate::core::store::{Document, UniqueKey};
use argon2::password_hash::rand_core::OsRng;
use argon2::password_hash::{self, PasswordHasher, PasswordVerifier, SaltString};
use argon2::Argon2;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

/// Argon2id password digest in PHC string form
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PasswordHash(String);

impl PasswordHash {
    /// Hash `password` under a fresh random salt
    pub fn new(password: &str) -> Result<Self, password_hash::Error> {
        let salt = SaltString::generate(&mut OsRng);
        let phc = Argon2::default().hash_password(password.as_bytes(), &salt)?;
        Ok(PasswordHash(phc.to_string()))
    }

    /// Check `password` against this digest; an unreadable digest never matches
    pub fn verify(&self, password: &str) -> bool {
        match password_hash::PasswordHash::new(&self.0) {
            Ok(parsed) => Argon2::default()
                .verify_password(password.as_bytes(), &parsed)
                .is_ok(),
            Err(_) => false,
        }
    }
}

/// A registered account
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    #[serde(rename = "_id")]
    pub id: RecordId,
    pub username: String,
    pub email: String,
    #[serde(skip_serializing)]
    pub password: PasswordHash,
    pub role: Role,
    pub created_at: DateTime<Utc>,
}

impl User {
    pub fn principal(&self) -> Principal {
        Principal::new(self.id, self.username.clone(), self.role)
    }

    pub fn profile(&self) -> UserProfile {
        UserProfile {
            id: self.id,
            username: self.username.clone(),
            email: self.email.clone(),
            role: self.role,
        }
    }
}

impl Document for User {
    const COLLECTION: &'static str = "users";

    fn id(&self) -> RecordId {
        self.id
    }

    fn unique_keys(&self) -> Vec<UniqueKey> {
        vec![
            UniqueKey {
                index: "users.email",
                value: self.email.clone(),
                message: "User with this email or username already exists",
            },
            UniqueKey {
                index: "users.username",
                value: self.username.clone(),
                message: "User with this email or username already exists",
            },
        ]
    }

    fn sort_key(&self) -> DateTime<Utc> {
        self.created_at
    }
}

/// Public view of an account
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UserProfile {
    pub id: RecordId,
    pub username: String,
    pub email: String,
    pub role: Role,
}

/// Registration payload
#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct RegisterInput {
    pub username: Option<String>,
    #[validate(email)]
    pub email: Option<String>,
    pub password: Option<String>,
    pub role: Option<String>,
}

/// Login payload
#[derive(Debug, Clone, Default, Deserialize)]
pub struct LoginInput {
    pub email: Option<String>,
    pub password: Option<String>,
}
