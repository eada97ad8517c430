pub mod failover;
pub mod identity;
pub mod job;
pub mod log_probe;
pub mod node;

pub use failover::{FailoverPlan, FailoverReport, FailoverScenario};
pub use identity::ClusterIdentitySnapshot;
pub use job::{Job, JobReport, JobState, JobUser};
pub use log_probe::{LogContinuity, LogProbe};
pub use node::{NodeRecord, NodeStatus};
