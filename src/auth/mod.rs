//! Authentication and authorization for Bridgeway
//!
//! Provides:
//! - JWT token generation and validation
//! - Role gates for operation authorization
//! - Password hashing with Argon2

pub mod jwt;
pub mod password;
pub mod permissions;

pub use jwt::{extract_token_from_header, Claims, JwtValidator, TokenValidationResult};
pub use password::{hash_password, verify_password};
pub use permissions::{is_operation_allowed, required_access, Access};
