//! User Registry
//!
//! Record format: `id|username|passwordHash|accessLevel|email|phone`.
//! Activity logs are kept in memory only.

use sh_core::{AccessLevel, User};
use tracing::{info, warn};

use crate::codec::{join_fields, CodecResult, FieldReader};
use crate::registry::Registry;
use crate::storage::Record;

/// Data file for users
pub const STORAGE_KEY: &str = "users.dat";

pub type UserRegistry = Registry<User>;

impl Record for User {
    const KEY: &'static str = STORAGE_KEY;

    fn encode(&self) -> String {
        let access_level = self.access_level.code().to_string();
        join_fields([
            self.id.as_str(),
            self.username.as_str(),
            self.password_hash(),
            access_level.as_str(),
            self.email.as_str(),
            self.phone.as_str(),
        ])
    }

    fn decode(line: &str) -> CodecResult<Self> {
        let mut reader = FieldReader::exact(line, 6)?;
        let id = reader.string();
        let username = reader.string();
        let password_hash = reader.string();
        let access_level = reader.code("access_level", AccessLevel::from_code)?;
        let email = reader.string();
        let phone = reader.string();
        Ok(User::new(id, username, password_hash, access_level, email, phone))
    }
}

impl Registry<User> {
    /// Look up a user by username
    pub fn find_by_username(&self, username: &str) -> Option<&User> {
        self.iter().find(|user| user.username == username)
    }

    /// Check credentials and record the login on success
    ///
    /// Returns the user's id when the password matches.
    pub fn authenticate(&mut self, username: &str, password: &str) -> Option<String> {
        let Some(user) = self.iter_mut().find(|user| user.username == username) else {
            warn!("Login attempt for unknown user {}", username);
            return None;
        };
        if user.login(password) {
            info!("Authenticated {} ({})", user.username, user.access_level);
            Some(user.id.clone())
        } else {
            None
        }
    }

    /// Users matching a case-insensitive search over id, name, email and phone
    pub fn search(&self, query: &str) -> Vec<&User> {
        self.iter().filter(|user| user.matches(query)).collect()
    }

    pub fn admins(&self) -> Vec<&User> {
        self.iter().filter(|user| user.is_admin()).collect()
    }
}
