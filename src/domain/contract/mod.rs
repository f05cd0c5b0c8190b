//! Contract aggregate

pub mod model;
pub mod repository;

pub use model::{CancellationAction, CancellationRequest, Contract, ContractStatus};
pub use repository::{CancellationSettlement, ContractRepository, SettledCancellation};
