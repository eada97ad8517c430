use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::{ClusterIdentitySnapshot, LogContinuity};

/// 管理节点中断方式
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum FailoverScenario {
    /// 重启主节点，期望恢复后主节点不变
    Reboot,
    /// 关闭主节点，期望其他管理节点接管
    Shutdown,
}

impl std::fmt::Display for FailoverScenario {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FailoverScenario::Reboot => write!(f, "reboot"),
            FailoverScenario::Shutdown => write!(f, "shutdown"),
        }
    }
}

impl std::str::FromStr for FailoverScenario {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "reboot" => Ok(FailoverScenario::Reboot),
            "shutdown" => Ok(FailoverScenario::Shutdown),
            other => Err(format!("未知的故障切换场景: {other}")),
        }
    }
}

/// 一次故障切换检测的执行计划
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FailoverPlan {
    pub scenario: FailoverScenario,
    /// 触发后按顺序尝试重连的目标
    pub reconnect_targets: Vec<String>,
    /// 恢复阶段重连的原始管理入口
    pub primary_target: String,
    /// 关机场景下是否重新启动原主节点并验证主节点回切
    pub restore: bool,
}

impl FailoverPlan {
    pub fn reboot(primary_target: impl Into<String>) -> Self {
        let primary_target = primary_target.into();
        Self {
            scenario: FailoverScenario::Reboot,
            reconnect_targets: vec![primary_target.clone()],
            primary_target,
            restore: false,
        }
    }

    /// 关机后优先通过备用管理节点重连，最后才回到原入口
    pub fn shutdown(primary_target: impl Into<String>, alternates: Vec<String>) -> Self {
        let primary_target = primary_target.into();
        let mut reconnect_targets = alternates;
        if !reconnect_targets.contains(&primary_target) {
            reconnect_targets.push(primary_target.clone());
        }
        Self {
            scenario: FailoverScenario::Shutdown,
            reconnect_targets,
            primary_target,
            restore: false,
        }
    }

    pub fn with_restore(mut self, restore: bool) -> Self {
        self.restore = restore;
        self
    }
}

/// 故障切换检测结果
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FailoverReport {
    pub scenario: FailoverScenario,
    pub baseline: ClusterIdentitySnapshot,
    pub post: ClusterIdentitySnapshot,
    /// 实际完成重连的目标
    pub reconnected_via: String,
    pub log_checks: Vec<LogContinuity>,
    /// 恢复阶段的快照（未执行恢复时为空）
    pub restored: Option<ClusterIdentitySnapshot>,
    pub elapsed: Duration,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_shutdown_plan_prefers_alternates() {
        let plan = FailoverPlan::shutdown("10.0.0.1", vec!["10.0.0.2".to_string()]);
        assert_eq!(plan.reconnect_targets, vec!["10.0.0.2", "10.0.0.1"]);
        assert_eq!(plan.primary_target, "10.0.0.1");
        assert!(!plan.restore);

        let plan = FailoverPlan::reboot("10.0.0.1").with_restore(true);
        assert_eq!(plan.reconnect_targets, vec!["10.0.0.1"]);
        assert!(plan.restore);
    }

    #[test]
    fn test_scenario_parse() {
        assert_eq!("Reboot".parse::<FailoverScenario>(), Ok(FailoverScenario::Reboot));
        assert_eq!(
            "shutdown".parse::<FailoverScenario>(),
            Ok(FailoverScenario::Shutdown)
        );
        assert!("halt".parse::<FailoverScenario>().is_err());
    }
}
