//! Resolve AWS profiles into credentials and manage the active `[default]`
//! session in the shared credentials file.

pub mod aws;
pub mod cache;
pub mod chain;
pub mod cli;
pub mod commands;
pub mod config;
pub mod constants;
pub mod error;
pub mod login;
pub mod mfa;
pub mod monitor;
pub mod profile;
pub mod resolver;
pub mod session;

#[cfg(test)]
pub(crate) mod testing;
