//! Feature Assist — conversational builder for Lynk feature YAML.

pub mod channels;
pub mod config;
pub mod conversation;
pub mod error;
pub mod feature;
pub mod session;
