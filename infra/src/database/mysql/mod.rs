//! MySQL repository implementations

mod ban_repository_impl;
mod user_repository_impl;

pub use ban_repository_impl::MySqlBanRepository;
pub use user_repository_impl::{decode_roles, encode_roles, MySqlUserRepository};
