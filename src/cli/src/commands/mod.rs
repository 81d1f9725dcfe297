pub mod access;
pub mod config;
pub mod members;
pub mod roles;
pub mod templates;
pub mod users;
