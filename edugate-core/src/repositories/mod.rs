// src/repositories/mod.rs

pub mod postgres;

pub use postgres::{
    PostgresAccountRepository, PostgresCatalogRepository, PostgresCodePoolRepository,
    PostgresRedemptionStore,
};
