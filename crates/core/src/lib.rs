pub mod config;
pub mod errors;
pub mod models;
pub mod traits;

pub use config::ValidatorConfig;
pub use errors::{ErrorKind, ValidatorError, ValidatorResult};
pub use traits::{CommandExecutor, LifecycleAction, RemoteSession, SessionConnector, SessionGuard};
