//! Data structures for the tournament platform: users, OTPs, joins, rooms, deposits.

mod deposit;
mod join;
mod room;
mod user;

pub use deposit::{Deposit, DepositStatus};
pub use join::{Device, JoinStatus, TournamentJoin};
pub use room::Room;
pub use user::{Otp, User, UserProfile};
