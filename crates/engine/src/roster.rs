use std::time::Duration;

use metrics::counter;
use tokio::time::{sleep, Instant};
use tracing::{debug, info};
use validator_core::{
    config::RosterConfig,
    models::{NodeRecord, NodeStatus},
    CommandExecutor, ValidatorError, ValidatorResult,
};

/// 节点清单发现器
///
/// 把集群状态文本解析为节点记录，按健康状态与角色过滤，
/// 从主机名推导地址，并与静态节点列表合并。
pub struct NodeRosterDiscoverer {
    config: RosterConfig,
}

impl NodeRosterDiscoverer {
    pub fn new(config: RosterConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &RosterConfig {
        &self.config
    }

    /// 解析状态文本为节点记录，不足两列的行被跳过
    pub fn parse_records(&self, status_text: &str) -> Vec<NodeRecord> {
        tokenize(status_text)
            .into_iter()
            .map(|fields| {
                let status = NodeStatus::from_keyword(fields[1], &self.config.ok_keyword);
                let address = match status {
                    NodeStatus::Ok => derive_address(fields[0]),
                    _ => None,
                };
                NodeRecord {
                    raw_hostname: fields[0].to_string(),
                    status,
                    address,
                }
            })
            .collect()
    }

    /// 从状态文本发现节点地址，并与静态列表合并
    pub fn discover(
        &self,
        status_text: &str,
        role_exclusion: Option<&str>,
        static_addresses: &[String],
    ) -> ValidatorResult<Vec<String>> {
        let records = self.parse_records(status_text);
        let mut discovered = project(&records, role_exclusion);
        discovered.sort();

        let merged = merge_addresses(&discovered, static_addresses);
        if merged.is_empty() {
            return Err(ValidatorError::NoNodesFound);
        }

        info!(
            dynamic = discovered.len(),
            static_count = static_addresses.len(),
            unique = merged.len(),
            "计算节点地址发现完成"
        );
        Ok(merged)
    }

    /// 在集群上执行状态查询后发现节点
    pub async fn discover_from_cluster(
        &self,
        executor: &dyn CommandExecutor,
        role_exclusion: Option<&str>,
        static_addresses: &[String],
    ) -> ValidatorResult<Vec<String>> {
        let output = executor.execute(&self.config.status_command).await?;
        self.discover(&output, role_exclusion, static_addresses)
    }

    /// 仍然健康在线、不属于管理节点也不在静态列表中的动态节点
    pub fn pending_dynamic_nodes(&self, status_text: &str, static_addresses: &[String]) -> Vec<String> {
        let records = self.parse_records(status_text);
        project(&records, Some(&self.config.management_marker))
            .into_iter()
            .filter(|address| !static_addresses.contains(address))
            .collect()
    }

    /// 等待动态计算节点缩容消失
    ///
    /// 查询失败立即返回错误；超过 `drain_timeout_seconds` 仍有动态节点在线时返回 `TimedOut`。
    pub async fn wait_for_dynamic_nodes_to_drain(
        &self,
        executor: &dyn CommandExecutor,
        static_addresses: &[String],
    ) -> ValidatorResult<Duration> {
        let timeout = Duration::from_secs(self.config.drain_timeout_seconds);
        let interval = Duration::from_secs(self.config.drain_poll_interval_seconds);
        let started = Instant::now();

        loop {
            let elapsed = started.elapsed();
            if elapsed >= timeout {
                return Err(ValidatorError::TimedOut {
                    job_id: "dynamic-node-drain".to_string(),
                    elapsed,
                });
            }

            let output = executor.execute(&self.config.status_command).await?;
            let pending = self.pending_dynamic_nodes(&output, static_addresses);
            if pending.is_empty() {
                info!(elapsed_secs = elapsed.as_secs(), "动态计算节点已全部释放");
                return Ok(elapsed);
            }

            info!(pending = ?pending, elapsed_secs = elapsed.as_secs(), "等待动态计算节点释放");
            sleep(interval.min(timeout.saturating_sub(started.elapsed()))).await;
        }
    }
}

/// 按行、按空白切分，丢弃不足两列的行
pub fn tokenize(status_text: &str) -> Vec<Vec<&str>> {
    status_text
        .lines()
        .map(|line| line.split_whitespace().collect::<Vec<_>>())
        .filter(|fields| fields.len() >= 2)
        .collect()
}

/// 主机名至少四段时，取最后四段以 `.` 连接
pub fn derive_address(hostname: &str) -> Option<String> {
    let parts: Vec<&str> = hostname.split('-').collect();
    if parts.len() < 4 {
        return None;
    }
    Some(parts[parts.len() - 4..].join("."))
}

/// 选出健康且未被角色排除的节点地址（保持输入顺序）
pub fn project(records: &[NodeRecord], role_exclusion: Option<&str>) -> Vec<String> {
    records
        .iter()
        .filter(|record| record.is_ok())
        .filter(|record| match role_exclusion {
            Some(marker) => !record.raw_hostname.contains(marker),
            None => true,
        })
        .filter_map(|record| {
            if record.address.is_none() {
                counter!("validator_roster_lines_dropped_total").increment(1);
                debug!(hostname = %record.raw_hostname, "主机名格式不符合地址约定, 已跳过");
            }
            record.address.clone()
        })
        .collect()
}

/// 合并动态与静态地址：先保留动态地址，再按给定顺序追加新的静态地址
pub fn merge_addresses(discovered: &[String], static_addresses: &[String]) -> Vec<String> {
    let mut merged: Vec<String> = Vec::with_capacity(discovered.len() + static_addresses.len());
    for address in discovered.iter().chain(static_addresses) {
        if !merged.contains(address) {
            merged.push(address.clone());
        }
    }
    merged
}
