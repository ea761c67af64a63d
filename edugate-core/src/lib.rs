// src/lib.rs

pub mod auth;
pub mod config;
pub mod db;
pub mod http;
pub mod repositories;
pub mod services;
pub mod test_utils;

pub use config::ServerConfig;
pub use db::Database;
pub use edugate_common::error::Error;
