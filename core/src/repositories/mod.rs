pub mod ban;
pub mod user;

pub use ban::{BanRepository, InMemoryBanRepository};
pub use user::{InMemoryUserRepository, UserRepository};
