// File: src/services/mod.rs

pub mod access_gate;
pub mod code_pool_service;
pub mod entitlement_service;
pub mod redemption_service;

pub use access_gate::AccessGate;
pub use code_pool_service::CodePoolService;
pub use entitlement_service::EntitlementService;
pub use redemption_service::RedemptionService;
