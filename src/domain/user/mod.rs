//! User aggregate
//!
//! Contains the User entity, roles, addresses and the repository interface.

pub mod model;
pub mod repository;

pub use model::{Address, NewUser, User, UserRole};
pub use repository::UserRepository;
