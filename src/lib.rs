//! JSON API for user accounts and their money transactions.

pub mod app;
pub mod auth;
pub mod config;
pub mod docs;
pub mod error;
pub mod extract;
pub mod fibonacci;
pub mod repo;
pub mod state;
pub mod transactions;
pub mod users;
