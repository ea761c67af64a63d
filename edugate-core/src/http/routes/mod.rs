// edugate-core/src/http/routes/mod.rs

pub mod admin;
pub mod student;
