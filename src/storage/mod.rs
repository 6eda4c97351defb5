//! Storage layer: SQLite-backed persistence for users, OTPs, joins, rooms,
//! and deposits.

pub mod migrations;
pub mod schema;

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use log::{debug, warn};
use rusqlite::{params, Connection, ErrorCode, OptionalExtension};
use serde::Serialize;

use crate::auth;
use crate::error::{Error, Result};
use crate::models::{
    Deposit, DepositStatus, Device, JoinStatus, Otp, Room, TournamentJoin, User,
};

/// Storage engine for the tournament platform.
///
/// Wraps a single `SQLite` connection; the web server shares it behind a
/// mutex. All timestamps are stored as RFC 3339 text.
#[derive(Debug)]
pub struct Storage {
    /// Path to the database file.
    path: PathBuf,
    /// Database connection.
    conn: Connection,
}

impl Storage {
    /// Open or create a storage database at the given path.
    ///
    /// Creates the parent directories and database file if they don't exist,
    /// and initializes the schema.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();

        if let Some(parent) = path.parent() {
            if !parent.exists() {
                std::fs::create_dir_all(parent).map_err(|source| Error::DirectoryCreate {
                    path: parent.to_path_buf(),
                    source,
                })?;
            }
        }

        debug!("Opening database at {}", path.display());
        let conn = Connection::open(&path).map_err(|source| Error::DatabaseOpen {
            path: path.clone(),
            source,
        })?;

        // WAL keeps admin listing reads cheap while signups write
        conn.execute_batch("PRAGMA journal_mode=WAL; PRAGMA synchronous=NORMAL;")?;

        migrations::initialize_schema(&conn)?;

        Ok(Self { path, conn })
    }

    /// Create an in-memory storage instance for testing.
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().map_err(|source| Error::DatabaseOpen {
            path: PathBuf::from(":memory:"),
            source,
        })?;

        migrations::initialize_schema(&conn)?;

        Ok(Self {
            path: PathBuf::from(":memory:"),
            conn,
        })
    }

    /// Get the path to the database file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    // ---------- Users ----------

    /// Create a user with a freshly generated profile id.
    ///
    /// Retries on the (unlikely) profile-id collision. Returns
    /// `Error::EmailRegistered` if the email is already taken.
    pub fn create_user(&self, name: &str, email: &str, password_hash: &str) -> Result<User> {
        let created_at = Utc::now();
        loop {
            let profile_id = auth::generate_profile_id();
            let inserted = self.conn.execute(
                r"
                INSERT INTO users (profile_id, name, email, password_hash, created_at)
                VALUES (?1, ?2, ?3, ?4, ?5)
                ",
                params![
                    profile_id,
                    name,
                    email,
                    password_hash,
                    created_at.to_rfc3339()
                ],
            );
            match inserted {
                Ok(_) => {
                    let id = self.conn.last_insert_rowid();
                    debug!("Created user {} ({})", id, profile_id);
                    return Ok(User {
                        id,
                        profile_id,
                        name: name.to_string(),
                        email: email.to_string(),
                        password_hash: password_hash.to_string(),
                        created_at,
                    });
                }
                Err(e) if is_unique_violation(&e, "users.profile_id") => {
                    debug!("Profile id collision on {}, retrying", profile_id);
                }
                Err(e) if is_unique_violation(&e, "users.email") => {
                    return Err(Error::EmailRegistered(email.to_string()));
                }
                Err(e) => return Err(e.into()),
            }
        }
    }

    /// Look up a user by email.
    pub fn find_user_by_email(&self, email: &str) -> Result<Option<User>> {
        let user = self
            .conn
            .query_row(
                r"
                SELECT id, profile_id, name, email, password_hash, created_at
                FROM users WHERE email = ?1
                ",
                [email],
                Self::row_to_user,
            )
            .optional()?;
        Ok(user)
    }

    /// List all users, newest first.
    pub fn list_users(&self) -> Result<Vec<User>> {
        let mut stmt = self.conn.prepare(
            r"
            SELECT id, profile_id, name, email, password_hash, created_at
            FROM users ORDER BY id DESC
            ",
        )?;
        let users = stmt
            .query_map([], Self::row_to_user)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(users)
    }

    /// Delete a user by id. Returns `true` if a user was deleted.
    pub fn delete_user(&self, id: i64) -> Result<bool> {
        let affected = self.conn.execute("DELETE FROM users WHERE id = ?1", [id])?;
        Ok(affected > 0)
    }

    // ---------- OTPs ----------

    /// Store a freshly issued OTP.
    pub fn create_otp(&self, email: &str, code: &str, expires_at: DateTime<Utc>) -> Result<Otp> {
        self.conn.execute(
            "INSERT INTO otps (email, code, expires_at, used) VALUES (?1, ?2, ?3, 0)",
            params![email, code, expires_at.to_rfc3339()],
        )?;
        Ok(Otp {
            id: self.conn.last_insert_rowid(),
            email: email.to_string(),
            code: code.to_string(),
            expires_at,
            used: false,
        })
    }

    /// Most recently issued unused OTP matching email and code.
    pub fn latest_otp(&self, email: &str, code: &str) -> Result<Option<Otp>> {
        let otp = self
            .conn
            .query_row(
                r"
                SELECT id, email, code, expires_at, used
                FROM otps WHERE email = ?1 AND code = ?2 AND used = 0
                ORDER BY id DESC LIMIT 1
                ",
                params![email, code],
                Self::row_to_otp,
            )
            .optional()?;
        Ok(otp)
    }

    /// Mark an OTP consumed so it cannot be replayed.
    pub fn mark_otp_used(&self, id: i64) -> Result<()> {
        self.conn
            .execute("UPDATE otps SET used = 1 WHERE id = ?1", [id])?;
        Ok(())
    }

    /// Delete used and expired OTP rows. Returns the number removed.
    pub fn prune_otps(&self, now: DateTime<Utc>) -> Result<usize> {
        let affected = self.conn.execute(
            "DELETE FROM otps WHERE used = 1 OR expires_at < ?1",
            [now.to_rfc3339()],
        )?;
        Ok(affected)
    }

    // ---------- Tournament joins ----------

    /// Record a player's join request for a tournament slot (starts pending).
    pub fn create_join(
        &self,
        player_name: &str,
        game_id: &str,
        device: Device,
        slot: &str,
    ) -> Result<TournamentJoin> {
        let joined_at = Utc::now();
        let status = JoinStatus::Pending;
        self.conn.execute(
            r"
            INSERT INTO tournament_joins (player_name, game_id, device, slot, status, joined_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            ",
            params![
                player_name,
                game_id,
                device.to_string(),
                slot,
                status.to_string(),
                joined_at.to_rfc3339()
            ],
        )?;
        Ok(TournamentJoin {
            id: self.conn.last_insert_rowid(),
            player_name: player_name.to_string(),
            game_id: game_id.to_string(),
            device,
            slot: slot.to_string(),
            status,
            joined_at,
        })
    }

    /// List all join entries, newest first.
    pub fn list_joins(&self) -> Result<Vec<TournamentJoin>> {
        let mut stmt = self.conn.prepare(
            r"
            SELECT id, player_name, game_id, device, slot, status, joined_at
            FROM tournament_joins ORDER BY id DESC
            ",
        )?;
        let joins = stmt
            .query_map([], Self::row_to_join)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(joins)
    }

    /// Set a join entry's review status.
    pub fn set_join_status(&self, id: i64, status: JoinStatus) -> Result<()> {
        let affected = self.conn.execute(
            "UPDATE tournament_joins SET status = ?1 WHERE id = ?2",
            params![status.to_string(), id],
        )?;
        if affected == 0 {
            return Err(Error::not_found("join"));
        }
        Ok(())
    }

    /// Delete a join entry by id. Returns `true` if one was deleted.
    pub fn delete_join(&self, id: i64) -> Result<bool> {
        let affected = self
            .conn
            .execute("DELETE FROM tournament_joins WHERE id = ?1", [id])?;
        Ok(affected > 0)
    }

    // ---------- Rooms ----------

    /// Publish a custom room (id, password, type, map, start time).
    pub fn create_room(
        &self,
        room_id: &str,
        password: &str,
        match_type: &str,
        map: &str,
        starts_at: &str,
    ) -> Result<Room> {
        self.conn.execute(
            r"
            INSERT INTO rooms (room_id, password, match_type, map, starts_at)
            VALUES (?1, ?2, ?3, ?4, ?5)
            ",
            params![room_id, password, match_type, map, starts_at],
        )?;
        Ok(Room {
            id: self.conn.last_insert_rowid(),
            room_id: room_id.to_string(),
            password: password.to_string(),
            match_type: match_type.to_string(),
            map: map.to_string(),
            starts_at: starts_at.to_string(),
        })
    }

    /// List all rooms, newest first.
    pub fn list_rooms(&self) -> Result<Vec<Room>> {
        let mut stmt = self.conn.prepare(
            r"
            SELECT id, room_id, password, match_type, map, starts_at
            FROM rooms ORDER BY id DESC
            ",
        )?;
        let rooms = stmt
            .query_map([], Self::row_to_room)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(rooms)
    }

    /// Delete a room by id. Returns `true` if one was deleted.
    pub fn delete_room(&self, id: i64) -> Result<bool> {
        let affected = self.conn.execute("DELETE FROM rooms WHERE id = ?1", [id])?;
        Ok(affected > 0)
    }

    // ---------- Deposits ----------

    /// Record a deposit request (starts pending).
    pub fn create_deposit(
        &self,
        user_name: &str,
        profile_id: &str,
        email: &str,
        amount: i64,
        utr: &str,
    ) -> Result<Deposit> {
        let created_at = Utc::now();
        let status = DepositStatus::Pending;
        self.conn.execute(
            r"
            INSERT INTO deposits (user_name, profile_id, email, amount, utr, status, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            ",
            params![
                user_name,
                profile_id,
                email,
                amount,
                utr,
                status.to_string(),
                created_at.to_rfc3339()
            ],
        )?;
        Ok(Deposit {
            id: self.conn.last_insert_rowid(),
            user_name: user_name.to_string(),
            profile_id: profile_id.to_string(),
            email: email.to_string(),
            amount,
            utr: utr.to_string(),
            status,
            created_at,
        })
    }

    /// List all deposits, newest first.
    pub fn list_deposits(&self) -> Result<Vec<Deposit>> {
        let mut stmt = self.conn.prepare(
            r"
            SELECT id, user_name, profile_id, email, amount, utr, status, created_at
            FROM deposits ORDER BY id DESC
            ",
        )?;
        let deposits = stmt
            .query_map([], Self::row_to_deposit)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(deposits)
    }

    /// Approve or reject a pending deposit.
    ///
    /// Only pending deposits transition; re-processing returns
    /// `Error::InvalidTransition`.
    pub fn set_deposit_status(&self, id: i64, status: DepositStatus) -> Result<()> {
        let current: Option<String> = self
            .conn
            .query_row("SELECT status FROM deposits WHERE id = ?1", [id], |row| {
                row.get(0)
            })
            .optional()?;
        let current = current.ok_or_else(|| Error::not_found("deposit"))?;
        if DepositStatus::parse(&current) != Some(DepositStatus::Pending) {
            return Err(Error::invalid_transition(format!(
                "deposit already {current}"
            )));
        }
        self.conn.execute(
            "UPDATE deposits SET status = ?1 WHERE id = ?2",
            params![status.to_string(), id],
        )?;
        Ok(())
    }

    // ---------- Dashboard ----------

    /// Counters backing the admin dashboard cards.
    pub fn stats(&self) -> Result<DashboardStats> {
        let users = self.count_table("users")?;
        let rooms = self.count_table("rooms")?;
        let joins = self.count_table("tournament_joins")?;
        let pending_deposits: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM deposits WHERE status = 'pending'",
            [],
            |row| row.get(0),
        )?;
        Ok(DashboardStats {
            users,
            rooms,
            joins,
            pending_deposits,
        })
    }

    fn count_table(&self, table: &str) -> Result<i64> {
        // Table names come from the fixed set above, never from input.
        let count: i64 =
            self.conn
                .query_row(&format!("SELECT COUNT(*) FROM {table}"), [], |row| {
                    row.get(0)
                })?;
        Ok(count)
    }

    // ---------- Row converters ----------

    fn row_to_user(row: &rusqlite::Row) -> rusqlite::Result<User> {
        let created_at: String = row.get(5)?;
        Ok(User {
            id: row.get(0)?,
            profile_id: row.get(1)?,
            name: row.get(2)?,
            email: row.get(3)?,
            password_hash: row.get(4)?,
            created_at: parse_timestamp(&created_at),
        })
    }

    fn row_to_otp(row: &rusqlite::Row) -> rusqlite::Result<Otp> {
        let expires_at: String = row.get(3)?;
        let used: i64 = row.get(4)?;
        Ok(Otp {
            id: row.get(0)?,
            email: row.get(1)?,
            code: row.get(2)?,
            expires_at: parse_timestamp(&expires_at),
            used: used != 0,
        })
    }

    fn row_to_join(row: &rusqlite::Row) -> rusqlite::Result<TournamentJoin> {
        let device_str: String = row.get(3)?;
        let status_str: String = row.get(5)?;
        let joined_at: String = row.get(6)?;
        let device = Device::parse(&device_str).unwrap_or_else(|| {
            warn!("Unknown device: {}, defaulting to android", device_str);
            Device::default()
        });
        let status = JoinStatus::parse(&status_str).unwrap_or_else(|| {
            warn!("Unknown join status: {}, defaulting to pending", status_str);
            JoinStatus::default()
        });
        Ok(TournamentJoin {
            id: row.get(0)?,
            player_name: row.get(1)?,
            game_id: row.get(2)?,
            device,
            slot: row.get(4)?,
            status,
            joined_at: parse_timestamp(&joined_at),
        })
    }

    fn row_to_room(row: &rusqlite::Row) -> rusqlite::Result<Room> {
        Ok(Room {
            id: row.get(0)?,
            room_id: row.get(1)?,
            password: row.get(2)?,
            match_type: row.get(3)?,
            map: row.get(4)?,
            starts_at: row.get(5)?,
        })
    }

    fn row_to_deposit(row: &rusqlite::Row) -> rusqlite::Result<Deposit> {
        let status_str: String = row.get(6)?;
        let created_at: String = row.get(7)?;
        let status = DepositStatus::parse(&status_str).unwrap_or_else(|| {
            warn!(
                "Unknown deposit status: {}, defaulting to pending",
                status_str
            );
            DepositStatus::default()
        });
        Ok(Deposit {
            id: row.get(0)?,
            user_name: row.get(1)?,
            profile_id: row.get(2)?,
            email: row.get(3)?,
            amount: row.get(4)?,
            utr: row.get(5)?,
            status,
            created_at: parse_timestamp(&created_at),
        })
    }
}

/// Counters shown on the admin dashboard.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize)]
pub struct DashboardStats {
    pub users: i64,
    pub rooms: i64,
    pub joins: i64,
    pub pending_deposits: i64,
}

fn parse_timestamp(s: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(s).map_or_else(|_| Utc::now(), |dt| dt.with_timezone(&Utc))
}

fn is_unique_violation(err: &rusqlite::Error, column: &str) -> bool {
    match err {
        rusqlite::Error::SqliteFailure(f, Some(msg)) => {
            f.code == ErrorCode::ConstraintViolation && msg.contains(column)
        }
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn create_test_storage() -> Storage {
        Storage::open_in_memory().expect("failed to create test storage")
    }

    #[test]
    fn open_in_memory_works() {
        assert!(Storage::open_in_memory().is_ok());
    }

    #[test]
    fn create_and_find_user() {
        let storage = create_test_storage();
        let user = storage
            .create_user("ShadowHunter", "shadow@example.com", "$2b$10$hash")
            .unwrap();
        assert!(user.profile_id.starts_with("BGMI-"));

        let found = storage.find_user_by_email("shadow@example.com").unwrap();
        assert_eq!(found, Some(user));
        assert!(storage.find_user_by_email("nobody@example.com").unwrap().is_none());
    }

    #[test]
    fn duplicate_email_rejected() {
        let storage = create_test_storage();
        storage
            .create_user("A", "dup@example.com", "$2b$10$hash")
            .unwrap();
        let err = storage
            .create_user("B", "dup@example.com", "$2b$10$hash")
            .unwrap_err();
        assert!(matches!(err, Error::EmailRegistered(_)));
    }

    #[test]
    fn list_users_newest_first() {
        let storage = create_test_storage();
        storage.create_user("A", "a@example.com", "h").unwrap();
        storage.create_user("B", "b@example.com", "h").unwrap();
        let users = storage.list_users().unwrap();
        assert_eq!(users.len(), 2);
        assert_eq!(users[0].name, "B");
        assert_eq!(users[1].name, "A");
    }

    #[test]
    fn delete_user() {
        let storage = create_test_storage();
        let user = storage.create_user("A", "a@example.com", "h").unwrap();
        assert!(storage.delete_user(user.id).unwrap());
        assert!(!storage.delete_user(user.id).unwrap());
        assert!(storage.list_users().unwrap().is_empty());
    }

    #[test]
    fn otp_lookup_picks_latest_unused() {
        let storage = create_test_storage();
        let expires = Utc::now() + Duration::minutes(5);
        let first = storage.create_otp("p@example.com", "111111", expires).unwrap();
        let second = storage.create_otp("p@example.com", "111111", expires).unwrap();
        assert!(second.id > first.id);

        let found = storage.latest_otp("p@example.com", "111111").unwrap().unwrap();
        assert_eq!(found.id, second.id);

        storage.mark_otp_used(second.id).unwrap();
        let found = storage.latest_otp("p@example.com", "111111").unwrap().unwrap();
        assert_eq!(found.id, first.id);
    }

    #[test]
    fn otp_lookup_misses_wrong_code() {
        let storage = create_test_storage();
        let expires = Utc::now() + Duration::minutes(5);
        storage.create_otp("p@example.com", "111111", expires).unwrap();
        assert!(storage.latest_otp("p@example.com", "222222").unwrap().is_none());
        assert!(storage.latest_otp("q@example.com", "111111").unwrap().is_none());
    }

    #[test]
    fn prune_removes_used_and_expired() {
        let storage = create_test_storage();
        let now = Utc::now();
        let live = storage
            .create_otp("a@example.com", "111111", now + Duration::minutes(5))
            .unwrap();
        storage
            .create_otp("b@example.com", "222222", now - Duration::minutes(1))
            .unwrap();
        let used = storage
            .create_otp("c@example.com", "333333", now + Duration::minutes(5))
            .unwrap();
        storage.mark_otp_used(used.id).unwrap();

        let pruned = storage.prune_otps(now).unwrap();
        assert_eq!(pruned, 2);
        let still_there = storage.latest_otp("a@example.com", "111111").unwrap();
        assert_eq!(still_there.map(|o| o.id), Some(live.id));
    }

    #[test]
    fn join_lifecycle() {
        let storage = create_test_storage();
        let join = storage
            .create_join("SniperKing", "5876543210", Device::Ios, "TDM-02")
            .unwrap();
        assert_eq!(join.status, JoinStatus::Pending);

        storage.set_join_status(join.id, JoinStatus::Confirmed).unwrap();
        let joins = storage.list_joins().unwrap();
        assert_eq!(joins[0].status, JoinStatus::Confirmed);

        assert!(storage.delete_join(join.id).unwrap());
        assert!(storage.list_joins().unwrap().is_empty());
    }

    #[test]
    fn join_status_unknown_id() {
        let storage = create_test_storage();
        let err = storage.set_join_status(42, JoinStatus::Rejected).unwrap_err();
        assert!(matches!(err, Error::NotFound { .. }));
    }

    #[test]
    fn room_lifecycle() {
        let storage = create_test_storage();
        let room = storage
            .create_room("784512", "tiger", "1v1 TDM", "Warehouse", "2025-12-22T08:50")
            .unwrap();
        let rooms = storage.list_rooms().unwrap();
        assert_eq!(rooms, vec![room.clone()]);
        assert!(storage.delete_room(room.id).unwrap());
        assert!(!storage.delete_room(room.id).unwrap());
    }

    #[test]
    fn deposit_approve_flow() {
        let storage = create_test_storage();
        let deposit = storage
            .create_deposit("ShadowHunter", "BGMI-482913", "shadow@example.com", 500, "UTR123")
            .unwrap();
        assert_eq!(deposit.status, DepositStatus::Pending);

        storage
            .set_deposit_status(deposit.id, DepositStatus::Approved)
            .unwrap();
        let deposits = storage.list_deposits().unwrap();
        assert_eq!(deposits[0].status, DepositStatus::Approved);

        // Re-processing a settled deposit is refused
        let err = storage
            .set_deposit_status(deposit.id, DepositStatus::Rejected)
            .unwrap_err();
        assert!(matches!(err, Error::InvalidTransition { .. }));
    }

    #[test]
    fn deposit_unknown_id() {
        let storage = create_test_storage();
        let err = storage
            .set_deposit_status(7, DepositStatus::Approved)
            .unwrap_err();
        assert!(matches!(err, Error::NotFound { .. }));
    }

    #[test]
    fn stats_counts() {
        let storage = create_test_storage();
        storage.create_user("A", "a@example.com", "h").unwrap();
        storage
            .create_room("1", "pw", "1v1 TDM", "Livik", "2025-12-22T08:50")
            .unwrap();
        storage
            .create_join("A", "123", Device::Android, "TDM-01")
            .unwrap();
        let d1 = storage
            .create_deposit("A", "BGMI-1", "a@example.com", 100, "U1")
            .unwrap();
        storage
            .create_deposit("A", "BGMI-1", "a@example.com", 200, "U2")
            .unwrap();
        storage
            .set_deposit_status(d1.id, DepositStatus::Approved)
            .unwrap();

        let stats = storage.stats().unwrap();
        assert_eq!(
            stats,
            DashboardStats {
                users: 1,
                rooms: 1,
                joins: 1,
                pending_deposits: 1,
            }
        );
    }
}
