// File: edugate-common/src/traits/mod.rs
pub mod repository_traits;

pub use repository_traits::{
    AccountRepository, CatalogRepository, CodePoolRepository, RedemptionStore, RedemptionUnit,
};
