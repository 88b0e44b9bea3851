//! Identity resolution for verified phone numbers

mod service;

#[cfg(test)]
mod tests;

pub use service::IdentityService;
