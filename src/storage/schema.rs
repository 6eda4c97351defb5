//! SQLite schema definitions for the tournament platform.

/// SQL statement to create the users table.
pub const CREATE_USERS_TABLE: &str = r"
CREATE TABLE IF NOT EXISTS users (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    profile_id TEXT UNIQUE NOT NULL,
    name TEXT NOT NULL,
    email TEXT UNIQUE NOT NULL,
    password_hash TEXT NOT NULL,
    created_at TEXT NOT NULL
)
";

/// SQL statement to create the otps table.
pub const CREATE_OTPS_TABLE: &str = r"
CREATE TABLE IF NOT EXISTS otps (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    email TEXT NOT NULL,
    code TEXT NOT NULL,
    expires_at TEXT NOT NULL,
    used INTEGER NOT NULL DEFAULT 0
)
";

/// SQL statement to create the tournament joins table.
pub const CREATE_JOINS_TABLE: &str = r"
CREATE TABLE IF NOT EXISTS tournament_joins (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    player_name TEXT NOT NULL,
    game_id TEXT NOT NULL,
    device TEXT NOT NULL,
    slot TEXT NOT NULL,
    status TEXT NOT NULL,
    joined_at TEXT NOT NULL
)
";

/// SQL statement to create the rooms table.
pub const CREATE_ROOMS_TABLE: &str = r"
CREATE TABLE IF NOT EXISTS rooms (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    room_id TEXT NOT NULL,
    password TEXT NOT NULL,
    match_type TEXT NOT NULL,
    map TEXT NOT NULL,
    starts_at TEXT NOT NULL
)
";

/// SQL statement to create the deposits table.
pub const CREATE_DEPOSITS_TABLE: &str = r"
CREATE TABLE IF NOT EXISTS deposits (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    user_name TEXT NOT NULL,
    profile_id TEXT NOT NULL,
    email TEXT NOT NULL,
    amount INTEGER NOT NULL,
    utr TEXT NOT NULL,
    status TEXT NOT NULL,
    created_at TEXT NOT NULL
)
";

/// Index on otps(email) for latest-code lookups during verification.
pub const CREATE_OTP_EMAIL_INDEX: &str = r"
CREATE INDEX IF NOT EXISTS idx_otps_email ON otps(email)
";

/// Index on deposits(status) for the pending-queue listing.
pub const CREATE_DEPOSIT_STATUS_INDEX: &str = r"
CREATE INDEX IF NOT EXISTS idx_deposits_status ON deposits(status)
";

/// Index on tournament_joins(status) for filtered admin views.
pub const CREATE_JOIN_STATUS_INDEX: &str = r"
CREATE INDEX IF NOT EXISTS idx_joins_status ON tournament_joins(status)
";

/// All schema creation statements in order.
pub const SCHEMA_STATEMENTS: &[&str] = &[
    CREATE_USERS_TABLE,
    CREATE_OTPS_TABLE,
    CREATE_JOINS_TABLE,
    CREATE_ROOMS_TABLE,
    CREATE_DEPOSITS_TABLE,
    CREATE_OTP_EMAIL_INDEX,
    CREATE_DEPOSIT_STATUS_INDEX,
    CREATE_JOIN_STATUS_INDEX,
];
