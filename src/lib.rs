//! BGMI tournament registration platform: models, auth, storage, and signup flows.

pub mod auth;
pub mod error;
pub mod logic;
pub mod models;
pub mod storage;

pub use error::{Error, Result};
pub use logic::{login, register_with_otp, request_otp};
pub use models::{
    Deposit, DepositStatus, Device, JoinStatus, Otp, Room, TournamentJoin, User, UserProfile,
};
pub use storage::{DashboardStats, Storage};
