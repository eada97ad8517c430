pub mod executor;
pub mod session;

pub use executor::{CommandExecutor, LifecycleAction, RemoteSession, SessionConnector};
pub use session::SessionGuard;
