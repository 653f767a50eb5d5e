//! CRUD operations for [`User`] records.

use rusqlite::{params, OptionalExtension};

use crate::database::Database;
use crate::error::{Result, StoreError};
use crate::models::{NewUser, User};

const USER_COLUMNS: &str = "id, username, email, password_hash";

impl Database {
    /// Insert a new user and return it with its assigned id.
    ///
    /// Fails with [`StoreError::Conflict`] when the username or e-mail is
    /// already taken.
    pub fn create_user(&self, user: &NewUser) -> Result<User> {
        self.conn()
            .execute(
                "INSERT INTO users (username, email, password_hash) VALUES (?1, ?2, ?3)",
                params![user.username, user.email, user.password_hash],
            )
            .map_err(|e| match e {
                rusqlite::Error::SqliteFailure(err, msg)
                    if err.code == rusqlite::ErrorCode::ConstraintViolation =>
                {
                    StoreError::Conflict(msg.unwrap_or_else(|| "unique constraint".to_string()))
                }
                other => StoreError::Sqlite(other),
            })?;

        Ok(User {
            id: self.conn().last_insert_rowid(),
            username: user.username.clone(),
            email: user.email.clone(),
            password_hash: user.password_hash.clone(),
        })
    }

    pub fn get_user(&self, id: i64) -> Result<User> {
        self.conn()
            .query_row(
                &format!("SELECT {USER_COLUMNS} FROM users WHERE id = ?1"),
                params![id],
                row_to_user,
            )
            .map_err(StoreError::from_lookup)
    }

    /// Look a user up by exact (case-sensitive) username.
    pub fn find_user_by_username(&self, username: &str) -> Result<Option<User>> {
        let user = self
            .conn()
            .query_row(
                &format!("SELECT {USER_COLUMNS} FROM users WHERE username = ?1"),
                params![username],
                row_to_user,
            )
            .optional()?;
        Ok(user)
    }

    /// Replace a user's password hash. Returns `true` if the user exists.
    pub fn update_password_hash(&self, id: i64, password_hash: &str) -> Result<bool> {
        let affected = self.conn().execute(
            "UPDATE users SET password_hash = ?1 WHERE id = ?2",
            params![password_hash, id],
        )?;
        Ok(affected > 0)
    }

    pub fn delete_user(&self, id: i64) -> Result<bool> {
        let affected = self
            .conn()
            .execute("DELETE FROM users WHERE id = ?1", params![id])?;
        Ok(affected > 0)
    }
}

fn row_to_user(row: &rusqlite::Row<'_>) -> rusqlite::Result<User> {
    Ok(User {
        id: row.get(0)?,
        username: row.get(1)?,
        email: row.get(2)?,
        password_hash: row.get(3)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn new_user(username: &str, email: &str) -> NewUser {
        NewUser {
            username: username.to_string(),
            email: email.to_string(),
            password_hash: "$argon2id$placeholder".to_string(),
        }
    }

    #[test]
    fn test_create_and_find() {
        let db = Database::open_in_memory().unwrap();
        let created = db.create_user(&new_user("admin", "admin@example.com")).unwrap();

        let found = db.find_user_by_username("admin").unwrap().unwrap();
        assert_eq!(found, created);
        assert_eq!(db.get_user(created.id).unwrap(), created);
    }

    #[test]
    fn test_username_lookup_is_case_sensitive() {
        let db = Database::open_in_memory().unwrap();
        db.create_user(&new_user("admin", "admin@example.com")).unwrap();

        assert!(db.find_user_by_username("Admin").unwrap().is_none());
        assert!(db.find_user_by_username("nobody").unwrap().is_none());
    }

    #[test]
    fn test_duplicate_username_or_email_conflicts() {
        let db = Database::open_in_memory().unwrap();
        db.create_user(&new_user("admin", "admin@example.com")).unwrap();

        assert!(matches!(
            db.create_user(&new_user("admin", "other@example.com")),
            Err(StoreError::Conflict(_))
        ));
        assert!(matches!(
            db.create_user(&new_user("other", "admin@example.com")),
            Err(StoreError::Conflict(_))
        ));
    }

    #[test]
    fn test_update_password_hash() {
        let db = Database::open_in_memory().unwrap();
        let user = db.create_user(&new_user("admin", "admin@example.com")).unwrap();

        assert!(db.update_password_hash(user.id, "$argon2id$new").unwrap());
        assert_eq!(db.get_user(user.id).unwrap().password_hash, "$argon2id$new");
        assert!(!db.update_password_hash(user.id + 1, "x").unwrap());
    }

    #[test]
    fn test_delete_user() {
        let db = Database::open_in_memory().unwrap();
        let user = db.create_user(&new_user("admin", "admin@example.com")).unwrap();

        assert!(db.delete_user(user.id).unwrap());
        assert!(matches!(db.get_user(user.id), Err(StoreError::NotFound)));
    }
}
