use serde::{Deserialize, Serialize};

/// 共享日志目录中某个节点某个服务的日志文件
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct LogProbe {
    pub node: String,
    pub service: String,
    pub node_path: String,
    /// `stat -c %Y` 返回的修改时间（epoch秒）
    pub modified_at: Option<i64>,
}

impl LogProbe {
    /// 路径约定: `<shared_log_dir>/<node>/<service>.log.<node>`
    pub fn new(shared_log_dir: &str, node: &str, service: &str) -> Self {
        let dir = shared_log_dir.trim_end_matches('/');
        Self {
            node: node.to_string(),
            service: service.to_string(),
            node_path: format!("{dir}/{node}/{service}.log.{node}"),
            modified_at: None,
        }
    }

    pub fn stat_command(&self) -> String {
        format!("stat -c %Y {}", self.node_path)
    }

    /// 记录最新观测到的修改时间，返回上一次的值
    pub fn record(&mut self, modified_at: i64) -> Option<i64> {
        self.modified_at.replace(modified_at)
    }
}

/// 一次前后对比的日志连续性结果
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct LogContinuity {
    pub path: String,
    pub before: i64,
    pub after: i64,
}

impl LogContinuity {
    pub fn advanced(&self) -> bool {
        self.after > self.before
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_probe_path() {
        let probe = LogProbe::new("/mnt/lsf/log/", "mgmt-1", "mbatchd");
        assert_eq!(probe.node_path, "/mnt/lsf/log/mgmt-1/mbatchd.log.mgmt-1");
        assert_eq!(
            probe.stat_command(),
            "stat -c %Y /mnt/lsf/log/mgmt-1/mbatchd.log.mgmt-1"
        );
    }

    #[test]
    fn test_record_keeps_previous_observation() {
        let mut probe = LogProbe::new("/mnt/lsf/log", "mgmt-1", "lim");
        assert_eq!(probe.record(1000), None);
        assert_eq!(probe.record(1050), Some(1000));
        assert_eq!(probe.modified_at, Some(1050));
    }

    #[test]
    fn test_continuity_requires_strict_increase() {
        let same = LogContinuity {
            path: "p".to_string(),
            before: 1000,
            after: 1000,
        };
        assert!(!same.advanced());
        let later = LogContinuity { after: 1050, ..same };
        assert!(later.advanced());
    }
}
