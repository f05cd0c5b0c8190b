//! HTTP REST API
//!
//! - `common`: response envelope, error mapping, validated JSON extractor
//! - `middleware`: bearer-token authentication
//! - `modules`: one module per resource (DTOs + handlers)
//! - `router`: route table, OpenAPI document and Swagger UI

pub mod common;
pub mod middleware;
pub mod modules;
pub mod router;

pub use router::{create_api_router, AppState, ServiceSettings};
