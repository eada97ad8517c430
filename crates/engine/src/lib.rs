//! 集群部署后验证引擎
//!
//! - [`job_monitor`]: 作业提交、轮询与超时终止
//! - [`roster`]: 节点清单解析与地址合并
//! - [`identity`]: 主节点与管理节点身份查询
//! - [`failover`]: 主节点故障切换检测

pub mod failover;
pub mod identity;
pub mod job_monitor;
pub mod roster;

pub use failover::FailoverDetector;
pub use identity::IdentityQuery;
pub use job_monitor::JobLifecycleMonitor;
pub use roster::NodeRosterDiscoverer;
