//! SQLite-backed user store

use crate::error::AppError;
use crate::models::User;
use rusqlite::{Connection, params};
use rust_decimal::Decimal;
use std::str::FromStr;
use std::sync::{Arc, Mutex};

/// Database connection wrapper
#[derive(Clone)]
pub struct Database {
    conn: Arc<Mutex<Connection>>,
}

/// Map a full `users` row onto a `User`.
///
/// `credit_limit` is stored as TEXT so the exact decimal survives storage.
fn row_to_user(row: &rusqlite::Row<'_>) -> rusqlite::Result<User> {
    let credit_limit: String = row.get(8)?;
    let credit_limit = Decimal::from_str(&credit_limit).map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(8, rusqlite::types::Type::Text, Box::new(e))
    })?;

    Ok(User {
        id: row.get(0)?,
        name: row.get(1)?,
        phone: row.get(2)?,
        email: row.get(3)?,
        address: row.get(4)?,
        role: row.get(5)?,
        is_admin: row.get(6)?,
        account_status: row.get(7)?,
        credit_limit,
        newsletter: row.get(9)?,
        promotions: row.get(10)?,
        password_hash: row.get(11)?,
    })
}

impl Database {
    /// Create a new in-memory database
    pub fn new_in_memory() -> Result<Self, AppError> {
        let conn = Connection::open_in_memory()?;
        let db = Self {
            conn: Arc::new(Mutex::new(conn)),
        };
        db.init_schema()?;
        Ok(db)
    }

    /// Create a database from file
    pub fn new_from_file(path: &str) -> Result<Self, AppError> {
        let conn = Connection::open(path)?;
        let db = Self {
            conn: Arc::new(Mutex::new(conn)),
        };
        db.init_schema()?;
        Ok(db)
    }

    /// Initialize database schema
    fn init_schema(&self) -> Result<(), AppError> {
        let conn = self.conn.lock().unwrap();

        conn.execute(
            "CREATE TABLE IF NOT EXISTS users (
                id TEXT PRIMARY KEY,
                name TEXT NOT NULL,
                phone TEXT NOT NULL,
                email TEXT UNIQUE NOT NULL,
                address TEXT NOT NULL,
                role TEXT NOT NULL DEFAULT 'USER',
                is_admin INTEGER NOT NULL DEFAULT 0,
                account_status TEXT NOT NULL DEFAULT 'ACTIVE',
                credit_limit TEXT NOT NULL,
                newsletter INTEGER NOT NULL DEFAULT 0,
                promotions INTEGER NOT NULL DEFAULT 0,
                password_hash TEXT NOT NULL
            )",
            [],
        )?;

        Ok(())
    }

    /// Insert a user record
    pub fn create_user(&self, user: &User) -> Result<(), AppError> {
        let conn = self.conn.lock().unwrap();
        conn.execute(
            "INSERT INTO users (id, name, phone, email, address, role, is_admin,
                account_status, credit_limit, newsletter, promotions, password_hash)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)",
            params![
                user.id,
                user.name,
                user.phone,
                user.email,
                user.address,
                user.role,
                user.is_admin,
                user.account_status,
                user.credit_limit.to_string(),
                user.newsletter,
                user.promotions,
                user.password_hash,
            ],
        )?;
        Ok(())
    }

    /// Get user by ID
    pub fn find_by_id(&self, id: &str) -> Result<Option<User>, AppError> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare(
            "SELECT id, name, phone, email, address, role, is_admin, account_status,
                credit_limit, newsletter, promotions, password_hash
             FROM users WHERE id = ?1",
        )?;

        let user = stmt.query_row(params![id], row_to_user).ok();

        Ok(user)
    }

    /// Get user by email
    pub fn find_by_email(&self, email: &str) -> Result<Option<User>, AppError> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare(
            "SELECT id, name, phone, email, address, role, is_admin, account_status,
                credit_limit, newsletter, promotions, password_hash
             FROM users WHERE email = ?1",
        )?;

        let user = stmt.query_row(params![email], row_to_user).ok();

        Ok(user)
    }

    /// Write a user back, all columns at once
    pub fn update_user(&self, user: &User) -> Result<(), AppError> {
        let conn = self.conn.lock().unwrap();
        conn.execute(
            "UPDATE users SET name = ?2, phone = ?3, email = ?4, address = ?5,
                role = ?6, is_admin = ?7, account_status = ?8, credit_limit = ?9,
                newsletter = ?10, promotions = ?11, password_hash = ?12
             WHERE id = ?1",
            params![
                user.id,
                user.name,
                user.phone,
                user.email,
                user.address,
                user.role,
                user.is_admin,
                user.account_status,
                user.credit_limit.to_string(),
                user.newsletter,
                user.promotions,
                user.password_hash,
            ],
        )?;
        Ok(())
    }

    /// Seed the lab accounts. Idempotent.
    pub fn seed_users(&self) -> Result<(), AppError> {
        let conn = self.conn.lock().unwrap();

        // Check if already seeded
        let count: i64 = conn.query_row("SELECT COUNT(*) FROM users", [], |row| row.get(0))?;
        if count > 0 {
            return Ok(());
        }

        drop(conn); // Release lock before calling create_user

        use argon2::{
            Argon2,
            password_hash::{PasswordHasher, SaltString, rand_core::OsRng},
        };

        let argon2 = Argon2::default();

        // (id, name, phone, email, address, role, is_admin, status,
        //  credit_limit, newsletter, promotions, password)
        let fixtures = [
            (
                "U1001",
                "Priya Raman",
                "+1-202-555-0114",
                "priya.raman@creditlab.test",
                "17 Beacon Court, Arlington, VA",
                "ADMIN",
                true,
                "ACTIVE",
                "250000.00",
                false,
                false,
                "admin123",
            ),
            (
                "U1002",
                "Marcus Webb",
                "+1-415-555-0162",
                "marcus.webb@creditlab.test",
                "982 Fulton Street, San Francisco, CA",
                "USER",
                false,
                "ACTIVE",
                "5000.00",
                true,
                true,
                "password123",
            ),
            (
                "U1003",
                "Elena Sokolova",
                "+44-20-7946-0821",
                "elena.sokolova@creditlab.test",
                "4 Harewood Row, London",
                "USER",
                false,
                "ACTIVE",
                "7500.50",
                true,
                false,
                "winter2025",
            ),
            (
                "U1004",
                "Dev Patel",
                "+91-98-2025-4417",
                "dev.patel@creditlab.test",
                "55 Linking Road, Mumbai",
                "USER",
                false,
                "SUSPENDED",
                "0.00",
                false,
                true,
                "changeme1",
            ),
        ];

        for (
            id,
            name,
            phone,
            email,
            address,
            role,
            is_admin,
            account_status,
            credit_limit,
            newsletter,
            promotions,
            password,
        ) in fixtures
        {
            let salt = SaltString::generate(&mut OsRng);
            let password_hash = argon2
                .hash_password(password.as_bytes(), &salt)
                .map_err(|e| AppError::Internal(e.to_string()))?
                .to_string();

            let user = User {
                id: id.to_string(),
                name: name.to_string(),
                phone: phone.to_string(),
                email: email.to_string(),
                address: address.to_string(),
                role: role.to_string(),
                is_admin,
                account_status: account_status.to_string(),
                credit_limit: Decimal::from_str(credit_limit)
                    .map_err(|e| AppError::Internal(e.to_string()))?,
                newsletter,
                promotions,
                password_hash,
            };
            self.create_user(&user)?;
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_user(id: &str, credit_limit: &str) -> User {
        User {
            id: id.to_string(),
            name: "Test User".to_string(),
            phone: "+1-555-0100".to_string(),
            email: format!("{}@creditlab.test", id),
            address: "1 Test Way".to_string(),
            role: "USER".to_string(),
            is_admin: false,
            account_status: "ACTIVE".to_string(),
            credit_limit: Decimal::from_str(credit_limit).unwrap(),
            newsletter: false,
            promotions: false,
            password_hash: "unused".to_string(),
        }
    }

    #[test]
    fn test_seeded_users_are_present() {
        let db = Database::new_in_memory().unwrap();
        db.seed_users().unwrap();

        let admin = db.find_by_id("U1001").unwrap().unwrap();
        assert!(admin.is_admin);
        assert_eq!(admin.role, "ADMIN");
        assert_eq!(admin.credit_limit.to_string(), "250000.00");

        let marcus = db.find_by_email("marcus.webb@creditlab.test").unwrap().unwrap();
        assert_eq!(marcus.id, "U1002");
        assert_eq!(marcus.account_status, "ACTIVE");
    }

    #[test]
    fn test_seeding_twice_is_idempotent() {
        let db = Database::new_in_memory().unwrap();
        db.seed_users().unwrap();
        db.seed_users().unwrap();

        // A second pass must not duplicate the unique emails.
        let user = db.find_by_id("U1003").unwrap().unwrap();
        assert_eq!(user.name, "Elena Sokolova");
    }

    #[test]
    fn test_missing_user_is_none() {
        let db = Database::new_in_memory().unwrap();
        db.seed_users().unwrap();

        assert!(db.find_by_id("U9999").unwrap().is_none());
        assert!(db.find_by_email("nobody@creditlab.test").unwrap().is_none());
    }

    #[test]
    fn test_update_persists_all_fields() {
        let db = Database::new_in_memory().unwrap();
        db.create_user(&sample_user("T0001", "100.00")).unwrap();

        let mut user = db.find_by_id("T0001").unwrap().unwrap();
        user.name = "Renamed".to_string();
        user.role = "ADMIN".to_string();
        user.is_admin = true;
        user.credit_limit = Decimal::from_str("1234.56").unwrap();
        db.update_user(&user).unwrap();

        let reloaded = db.find_by_id("T0001").unwrap().unwrap();
        assert_eq!(reloaded.name, "Renamed");
        assert_eq!(reloaded.role, "ADMIN");
        assert!(reloaded.is_admin);
        assert_eq!(reloaded.credit_limit.to_string(), "1234.56");
    }

    #[test]
    fn test_exact_decimal_survives_storage() {
        let db = Database::new_in_memory().unwrap();
        db.create_user(&sample_user("T0002", "0.10")).unwrap();

        let user = db.find_by_id("T0002").unwrap().unwrap();
        assert_eq!(user.credit_limit.to_string(), "0.10");
        assert_eq!(user.credit_limit, Decimal::from_str("0.1").unwrap());
    }
}
