//! In-memory storage
//!
//! Used by tests and by `--in-memory` runs where nothing has to survive a
//! restart.

mod memory;

pub use memory::InMemoryStorage;
