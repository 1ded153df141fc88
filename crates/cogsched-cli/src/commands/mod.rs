pub mod chat;
pub mod config;
pub mod export;
pub mod health;
pub mod profile;
pub mod schedule;
pub mod tlx;
