pub mod auth;
pub mod billing;
pub mod certificates;
pub mod contracts;
pub mod health;
pub mod installations;
pub mod invoices;
pub mod metrics;
pub mod request_id;
pub mod tariffs;
pub mod users;
