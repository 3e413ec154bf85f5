pub mod config;
pub mod handlers;
pub mod model;
pub mod observability;
pub mod server;
pub mod store;

pub use config::{AppConfig, AsyncOperationsConfig, LoggingConfig, ServerConfig};
pub use model::{ApplicationRequest, ApplicationView, OperationState, OperationStatus};
pub use observability::init_tracing;
pub use server::{AppState, ArmrpServer, ServerBuilder, build_app, build_app_with_state};
pub use store::{ResourceStore, StoreError};
