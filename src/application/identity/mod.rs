//! Identity module: authentication, role checks and user administration

pub mod service;

pub use service::{require_role, AuthResult, IdentityService, NewAddress, Registration};
