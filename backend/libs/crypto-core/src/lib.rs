//! Shared security primitives: JWT access tokens and password hashing.

pub mod jwt;
pub mod password;

pub use password::{hash_password, verify_password, PasswordError};
