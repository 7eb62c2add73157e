//! User accounts and their activity history

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{info, warn};

use crate::entity::Entity;

const MIN_PASSWORD_LEN: usize = 3;

/// User permission level
///
/// The numeric codes are part of the record format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AccessLevel {
    #[default]
    User = 0,
    Admin = 1,
}

impl AccessLevel {
    pub fn code(self) -> u8 {
        self as u8
    }

    pub fn from_code(code: u8) -> Option<Self> {
        match code {
            0 => Some(AccessLevel::User),
            1 => Some(AccessLevel::Admin),
            _ => None,
        }
    }
}

impl fmt::Display for AccessLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AccessLevel::User => f.write_str("User"),
            AccessLevel::Admin => f.write_str("Administrator"),
        }
    }
}

/// Reasons a new password is rejected
#[derive(Debug, Clone, Copy, Error, PartialEq, Eq)]
pub enum PasswordError {
    #[error("password must be at least 3 characters")]
    TooShort,

    #[error("password must not contain spaces")]
    ContainsSpace,
}

/// Check a candidate password against the length and whitespace rules
pub fn validate_password(password: &str) -> Result<(), PasswordError> {
    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err(PasswordError::TooShort);
    }
    if password.contains(' ') {
        return Err(PasswordError::ContainsSpace);
    }
    Ok(())
}

/// One entry in a user's activity log
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Activity {
    /// Sequential per user, starting at 1
    pub id: u64,

    /// Acting user (lookup only)
    pub user_id: String,

    pub action: String,

    pub timestamp: DateTime<Utc>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub related_object: Option<String>,
}

/// A user account
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: String,

    pub username: String,

    pub access_level: AccessLevel,

    pub email: String,

    pub phone: String,

    pub created_at: DateTime<Utc>,

    #[serde(skip_serializing, default)]
    password_hash: String,

    /// In-memory only; never persisted
    #[serde(skip)]
    activity_log: Vec<Activity>,
}

impl User {
    pub fn new(
        id: impl Into<String>,
        username: impl Into<String>,
        password_hash: impl Into<String>,
        access_level: AccessLevel,
        email: impl Into<String>,
        phone: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            username: username.into(),
            access_level,
            email: email.into(),
            phone: phone.into(),
            created_at: Utc::now(),
            password_hash: password_hash.into(),
            activity_log: Vec::new(),
        }
    }

    /// Stored credential, as written to the record file
    pub fn password_hash(&self) -> &str {
        &self.password_hash
    }

    /// Check a password; a successful login is recorded in the activity log
    pub fn login(&mut self, password: &str) -> bool {
        let success = password == self.password_hash;
        if success {
            self.record_activity("logged in", None);
            info!("User {} logged in", self.username);
        } else {
            warn!("Failed login attempt for user {}", self.username);
        }
        success
    }

    pub fn logout(&mut self) {
        self.record_activity("logged out", None);
        info!("User {} logged out", self.username);
    }

    /// Replace the password after validating it
    pub fn change_password(&mut self, new_password: &str) -> Result<(), PasswordError> {
        validate_password(new_password)?;
        self.password_hash = new_password.to_string();
        self.record_activity("password changed", None);
        Ok(())
    }

    pub fn set_access_level(&mut self, level: AccessLevel) {
        self.access_level = level;
    }

    pub fn is_admin(&self) -> bool {
        self.access_level == AccessLevel::Admin
    }

    /// Append an activity entry
    pub fn record_activity(&mut self, action: impl Into<String>, related_object: Option<String>) {
        let id = self.activity_log.len() as u64 + 1;
        self.activity_log.push(Activity {
            id,
            user_id: self.id.clone(),
            action: action.into(),
            timestamp: Utc::now(),
            related_object,
        });
    }

    /// Activity log, oldest first
    pub fn activity_history(&self) -> &[Activity] {
        &self.activity_log
    }

    /// Email and phone, omitting empty values
    pub fn contact_info(&self) -> String {
        [("Email", &self.email), ("Phone", &self.phone)]
            .into_iter()
            .filter(|(_, value)| !value.is_empty())
            .map(|(label, value)| format!("{label}: {value}"))
            .collect::<Vec<_>>()
            .join(", ")
    }

    /// Case-insensitive substring match over id, username, email and phone
    pub fn matches(&self, search: &str) -> bool {
        let needle = search.to_lowercase();
        [&self.id, &self.username, &self.email, &self.phone]
            .into_iter()
            .any(|field| field.to_lowercase().contains(&needle))
    }
}

impl Entity for User {
    fn id(&self) -> &str {
        &self.id
    }

    fn name(&self) -> &str {
        &self.username
    }

    fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }
}

impl PartialEq for User {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for User {}
