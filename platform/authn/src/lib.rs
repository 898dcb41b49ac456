//! Platform authentication.
//!
//! The portal authenticates against a fixed table of demo accounts and
//! carries the result in an HS256-signed session token. There is no
//! password hashing, rate limiting or lockout; the table is a stand-in
//! for a real identity provider.

use std::{fmt, str::FromStr};

use chrono::{Duration, Utc};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const SESSION_COOKIE: &str = "portal_session";

#[derive(Debug, Error)]
pub enum AuthnError {
    #[error("Invalid credentials")]
    InvalidCredentials,
    #[error("session secret must be at least {min} bytes")]
    WeakSecret { min: usize },
    #[error("invalid session token")]
    InvalidToken(#[from] jsonwebtoken::errors::Error),
    #[error("unknown role {0}")]
    UnknownRole(String),
}

#[derive(Debug, Clone, Copy, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    Manager,
    Employee,
}

impl Role {
    pub fn as_str(self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::Manager => "manager",
            Role::Employee => "employee",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = AuthnError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "admin" => Ok(Role::Admin),
            "manager" => Ok(Role::Manager),
            "employee" => Ok(Role::Employee),
            other => Err(AuthnError::UnknownRole(other.to_string())),
        }
    }
}

/// Identity carried by an authenticated session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionUser {
    pub id: String,
    pub email: String,
    pub name: String,
    pub role: Role,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

struct DemoAccount {
    id: &'static str,
    email: &'static str,
    password: &'static str,
    name: &'static str,
    role: Role,
}

const DEMO_ACCOUNTS: [DemoAccount; 3] = [
    DemoAccount {
        id: "1",
        email: "admin@portal.local",
        password: "admin123",
        name: "Ada Admin",
        role: Role::Admin,
    },
    DemoAccount {
        id: "2",
        email: "manager@portal.local",
        password: "manager123",
        name: "Milo Manager",
        role: Role::Manager,
    },
    DemoAccount {
        id: "3",
        email: "employee@portal.local",
        password: "employee123",
        name: "Emil Employee",
        role: Role::Employee,
    },
];

impl DemoAccount {
    fn user(&self) -> SessionUser {
        SessionUser {
            id: self.id.to_string(),
            email: self.email.to_string(),
            name: self.name.to_string(),
            role: self.role,
        }
    }
}

/// Exact-match lookup against the demo account table.
pub fn authorize(credentials: &Credentials) -> Option<SessionUser> {
    DEMO_ACCOUNTS
        .iter()
        .find(|acc| acc.email == credentials.email && acc.password == credentials.password)
        .map(DemoAccount::user)
}

/// Every account in the table, without passwords.
pub fn demo_users() -> Vec<SessionUser> {
    DEMO_ACCOUNTS.iter().map(DemoAccount::user).collect()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionClaims {
    pub sub: String,
    pub email: String,
    pub name: String,
    pub role: Role,
    pub exp: usize,
    pub iat: usize,
}

impl From<SessionClaims> for SessionUser {
    fn from(claims: SessionClaims) -> Self {
        Self {
            id: claims.sub,
            email: claims.email,
            name: claims.name,
            role: claims.role,
        }
    }
}

/// Signing material for session tokens, derived from the single
/// configured secret.
#[derive(Clone)]
pub struct SessionKeys {
    encoding: EncodingKey,
    decoding: DecodingKey,
}

impl fmt::Debug for SessionKeys {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SessionKeys(..)")
    }
}

impl SessionKeys {
    pub const MIN_SECRET_LEN: usize = 32;

    pub fn from_secret(secret: &[u8]) -> Result<Self, AuthnError> {
        if secret.len() < Self::MIN_SECRET_LEN {
            return Err(AuthnError::WeakSecret {
                min: Self::MIN_SECRET_LEN,
            });
        }
        Ok(Self {
            encoding: EncodingKey::from_secret(secret),
            decoding: DecodingKey::from_secret(secret),
        })
    }

    pub fn issue(&self, user: &SessionUser, ttl: Duration) -> Result<String, AuthnError> {
        let now = Utc::now();
        let exp = now.checked_add_signed(ttl).unwrap_or(now).timestamp().max(0) as usize;
        let claims = SessionClaims {
            sub: user.id.clone(),
            email: user.email.clone(),
            name: user.name.clone(),
            role: user.role,
            exp,
            iat: now.timestamp().max(0) as usize,
        };
        Ok(jsonwebtoken::encode(
            &Header::default(),
            &claims,
            &self.encoding,
        )?)
    }

    pub fn verify(&self, token: &str) -> Result<SessionUser, AuthnError> {
        let data =
            jsonwebtoken::decode::<SessionClaims>(token, &self.decoding, &Validation::default())?;
        Ok(data.claims.into())
    }
}
