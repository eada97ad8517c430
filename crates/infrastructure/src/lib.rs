pub mod cloud;
pub mod ssh;

pub use cloud::CliInstanceAction;
pub use ssh::{SshConnector, SshSession};
