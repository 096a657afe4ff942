//! # Lectern Core
//!
//! Core types, errors, and utilities for the Lectern API.
//!
//! - [`errors`]: `AppError` with its stable [`ErrorKind`] and HTTP rendering
//! - [`pagination`]: Page-based catalog pagination
//! - [`password`]: bcrypt password hashing and verification
//!
//! # Example
//!
//! ```ignore
//! use lectern_core::{AppError, hash_password};
//!
//! let error = AppError::not_found("Course not found");
//! let hash = hash_password("secure_password")?;
//! ```

pub mod errors;
pub mod pagination;
pub mod password;

pub use errors::{AppError, ErrorKind, ErrorResponse};
pub use pagination::PageParams;
pub use password::{hash_password, verify_password};
