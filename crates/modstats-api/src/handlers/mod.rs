//! HTTP request handlers

pub mod analytics;
pub mod export;
pub mod health;
pub mod moderators;
pub mod stats;
