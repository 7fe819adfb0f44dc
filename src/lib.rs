#![doc = "The `tasklane` library crate."]
#![doc = ""]
#![doc = "Domain models, the store abstraction and its backends, bearer-token"]
#![doc = "authentication, routing and error handling for the Tasklane API."]
#![doc = "The binary (`main.rs`) wires these together into an `HttpServer`."]

pub mod auth;
pub mod config;
pub mod error;
pub mod models;
pub mod routes;
pub mod store;

pub use crate::error::AppError;
pub use crate::routes::AppState;
pub use crate::store::{MemoryStore, PgStore, Store};
