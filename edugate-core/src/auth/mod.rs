// edugate-core/src/auth/mod.rs

pub mod token;

pub use token::{DEFAULT_TOKEN_TTL_DAYS, TokenCodec};
