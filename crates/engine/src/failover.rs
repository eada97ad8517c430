use std::time::Duration;

use metrics::counter;
use tokio::time::{sleep, Instant};
use tracing::{error, info, warn};
use validator_core::{
    config::{FailoverConfig, RosterConfig},
    models::{
        ClusterIdentitySnapshot, FailoverPlan, FailoverReport, FailoverScenario, LogContinuity,
        LogProbe,
    },
    CommandExecutor, LifecycleAction, SessionConnector, SessionGuard, ValidatorError,
    ValidatorResult,
};

use crate::identity::{probe_log_time, IdentityQuery};

/// 主节点故障切换检测器
///
/// 线性状态机:
/// 采集基线 -> 记录日志时间 -> 触发中断 -> 等待稳定 -> 重新连接
/// -> 采集新快照 -> 校验主节点身份 -> 校验日志连续性 -> (可选) 恢复原主节点
pub struct FailoverDetector {
    config: FailoverConfig,
    identity: IdentityQuery,
}

impl FailoverDetector {
    pub fn new(config: FailoverConfig, roster: &RosterConfig) -> Self {
        let identity = IdentityQuery::new(&config, roster);
        Self { config, identity }
    }

    pub fn identity(&self) -> &IdentityQuery {
        &self.identity
    }

    pub fn settle_time(&self, scenario: FailoverScenario) -> Duration {
        match scenario {
            FailoverScenario::Reboot => Duration::from_secs(self.config.reboot_settle_seconds),
            FailoverScenario::Shutdown => Duration::from_secs(self.config.shutdown_settle_seconds),
        }
    }

    /// 执行一次故障切换检测
    ///
    /// `session` 在触发中断后释放；中途出错时由守卫在离开作用域时关闭。
    pub async fn detect_failover(
        &self,
        session: SessionGuard,
        action: &dyn LifecycleAction,
        connector: &dyn SessionConnector,
        plan: &FailoverPlan,
    ) -> ValidatorResult<FailoverReport> {
        let scenario = plan.scenario.to_string();
        let result = self.run(session, action, connector, plan).await;
        let outcome = if result.is_ok() { "success" } else { "failure" };
        counter!("validator_failover_checks_total", "scenario" => scenario, "outcome" => outcome)
            .increment(1);
        if let Err(e) = &result {
            error!(scenario = %plan.scenario, kind = ?e.kind(), error = %e, "故障切换检测失败");
        }
        result
    }

    async fn run(
        &self,
        session: SessionGuard,
        action: &dyn LifecycleAction,
        connector: &dyn SessionConnector,
        plan: &FailoverPlan,
    ) -> ValidatorResult<FailoverReport> {
        let started = Instant::now();

        let baseline = self.identity.capture_snapshot(&session, 1).await?;
        info!(
            scenario = %plan.scenario,
            master = %baseline.master_name,
            target = %session.target(),
            "已采集基线身份"
        );

        let mut probes = self.relevant_probes(plan.scenario, &baseline)?;
        for probe in probes.iter_mut() {
            probe_log_time(&session, probe).await?;
        }

        self.trigger(session, action, &baseline.master_name, plan.scenario)
            .await?;

        let settle = self.settle_time(plan.scenario);
        info!(settle_secs = settle.as_secs(), "等待集群稳定");
        sleep(settle).await;

        let (session, reconnected_via) =
            reconnect(connector, &plan.reconnect_targets).await?;
        let post = self.identity.capture_snapshot(&session, 2).await?;
        info!(master = %post.master_name, via = %reconnected_via, "已采集中断后身份");

        verify_identity(plan.scenario, &baseline, &post)?;

        let mut log_checks = Vec::with_capacity(probes.len());
        for probe in probes.iter_mut() {
            log_checks.push(reprobe_continuity(&session, probe).await?);
        }

        let restored = if plan.restore {
            match plan.scenario {
                FailoverScenario::Shutdown => Some(
                    self.restore(session, action, connector, plan, &baseline, &mut log_checks)
                        .await?,
                ),
                FailoverScenario::Reboot => {
                    warn!("重启场景无需恢复原主节点, 已忽略 restore 选项");
                    None
                }
            }
        } else {
            None
        };

        let report = FailoverReport {
            scenario: plan.scenario,
            baseline,
            post,
            reconnected_via,
            log_checks,
            restored,
            elapsed: started.elapsed(),
        };
        info!(
            scenario = %plan.scenario,
            elapsed_secs = report.elapsed.as_secs(),
            "故障切换检测通过"
        );
        Ok(report)
    }

    /// 重启检查主节点自身的日志，关机检查存活管理节点的日志
    fn relevant_probes(
        &self,
        scenario: FailoverScenario,
        baseline: &ClusterIdentitySnapshot,
    ) -> ValidatorResult<Vec<LogProbe>> {
        let dir = &self.config.shared_log_dir;
        match scenario {
            FailoverScenario::Reboot => Ok(vec![LogProbe::new(
                dir,
                &baseline.master_name,
                &self.config.master_log_service,
            )]),
            FailoverScenario::Shutdown => {
                let standby = baseline.standby_names();
                if standby.is_empty() {
                    return Err(ValidatorError::parse(
                        "至少一个备用管理节点",
                        baseline.management_names.join(","),
                    ));
                }
                Ok(standby
                    .iter()
                    .map(|node| LogProbe::new(dir, node, &self.config.management_log_service))
                    .collect())
            }
        }
    }

    /// 会话断开视为触发成功，命令正常返回说明节点没有被中断
    async fn trigger(
        &self,
        session: SessionGuard,
        action: &dyn LifecycleAction,
        node: &str,
        scenario: FailoverScenario,
    ) -> ValidatorResult<()> {
        info!(node = %node, scenario = %scenario, "触发主节点中断");
        let outcome = action.stop(&session, node, scenario).await;

        if let Err(e) = session.release() {
            warn!(node = %node, error = %e, "释放中断前会话失败");
        }

        match outcome {
            Err(e) if e.is_session_lost() => {
                info!(node = %node, "远程会话已按预期断开");
                Ok(())
            }
            Err(e) => Err(ValidatorError::TriggerFailed {
                node: node.to_string(),
                message: e.to_string(),
            }),
            Ok(output) => Err(ValidatorError::TriggerFailed {
                node: node.to_string(),
                message: format!("命令正常退出, 会话未断开: {}", output.trim()),
            }),
        }
    }

    /// 启动原主节点，经原始入口重连，要求主节点回切且日志继续写入
    async fn restore(
        &self,
        session: SessionGuard,
        action: &dyn LifecycleAction,
        connector: &dyn SessionConnector,
        plan: &FailoverPlan,
        baseline: &ClusterIdentitySnapshot,
        log_checks: &mut Vec<LogContinuity>,
    ) -> ValidatorResult<ClusterIdentitySnapshot> {
        let mut probe = LogProbe::new(
            &self.config.shared_log_dir,
            &baseline.master_name,
            &self.config.master_log_service,
        );
        probe_log_time(&session, &mut probe).await?;
        if let Err(e) = session.release() {
            warn!(error = %e, "释放备用入口会话失败");
        }

        info!(node = %baseline.master_name, "启动原主节点");
        action.start(&baseline.master_name).await?;

        let settle = Duration::from_secs(self.config.recovery_settle_seconds);
        sleep(settle).await;

        let (session, _) = reconnect(connector, std::slice::from_ref(&plan.primary_target)).await?;
        let restored = self.identity.capture_snapshot(&session, 3).await?;
        if restored.master_name != baseline.master_name {
            return Err(ValidatorError::FailoverDidNotRevert {
                expected: baseline.master_name.clone(),
                actual: restored.master_name,
            });
        }

        log_checks.push(reprobe_continuity(&session, &mut probe).await?);
        info!(master = %restored.master_name, "原主节点已恢复");
        Ok(restored)
    }
}

/// 按顺序尝试连接，返回第一个成功的会话；全部失败时返回最后一个错误
pub async fn reconnect(
    connector: &dyn SessionConnector,
    targets: &[String],
) -> ValidatorResult<(SessionGuard, String)> {
    let mut last_error = None;
    for target in targets {
        match connector.connect(target).await {
            Ok(session) => {
                info!(target = %target, "已重新建立远程会话");
                return Ok((SessionGuard::new(session), target.clone()));
            }
            Err(e) => {
                warn!(target = %target, error = %e, "重新连接失败, 尝试下一个目标");
                last_error = Some(e);
            }
        }
    }
    Err(last_error.unwrap_or_else(|| ValidatorError::connection("", "没有可用的重连目标")))
}

/// 关机要求主节点发生切换，重启要求主节点保持不变
pub fn verify_identity(
    scenario: FailoverScenario,
    baseline: &ClusterIdentitySnapshot,
    post: &ClusterIdentitySnapshot,
) -> ValidatorResult<()> {
    match scenario {
        FailoverScenario::Shutdown if post.master_name == baseline.master_name => {
            Err(ValidatorError::FailoverDidNotOccur {
                previous: baseline.master_name.clone(),
                current: post.master_name.clone(),
            })
        }
        FailoverScenario::Reboot if post.master_name != baseline.master_name => {
            Err(ValidatorError::FailoverDidNotRevert {
                expected: baseline.master_name.clone(),
                actual: post.master_name.clone(),
            })
        }
        _ => Ok(()),
    }
}

/// 再次探测已有基线的日志文件并校验其连续性
async fn reprobe_continuity(
    executor: &dyn CommandExecutor,
    probe: &mut LogProbe,
) -> ValidatorResult<LogContinuity> {
    let before = probe_log_time(executor, probe)
        .await?
        .ok_or_else(|| ValidatorError::parse(format!("{} 的基线修改时间", probe.node_path), ""))?;
    let after = probe.modified_at.unwrap_or(before);
    verify_log_continuity(&probe.node_path, before, after)
}

/// 日志修改时间必须严格增加
pub fn verify_log_continuity(path: &str, before: i64, after: i64) -> ValidatorResult<LogContinuity> {
    let check = LogContinuity {
        path: path.to_string(),
        before,
        after,
    };
    if !check.advanced() {
        return Err(ValidatorError::LogNotUpdated {
            path: check.path,
            before,
            after,
        });
    }
    Ok(check)
}
