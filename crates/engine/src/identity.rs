use tracing::debug;
use validator_core::{
    config::{FailoverConfig, RosterConfig},
    models::{ClusterIdentitySnapshot, LogProbe},
    CommandExecutor, ValidatorError, ValidatorResult,
};

use crate::roster::tokenize;

const MASTER_NAME_PREFIX: &str = "My master name is ";

/// 集群身份查询
#[derive(Debug, Clone)]
pub struct IdentityQuery {
    master_query_command: String,
    management_query_command: String,
    management_marker: String,
}

impl IdentityQuery {
    pub fn new(failover: &FailoverConfig, roster: &RosterConfig) -> Self {
        Self {
            master_query_command: failover.master_query_command.clone(),
            management_query_command: failover.management_query_command.clone(),
            management_marker: roster.management_marker.clone(),
        }
    }

    pub async fn master_name(&self, executor: &dyn CommandExecutor) -> ValidatorResult<String> {
        let output = executor.execute(&self.master_query_command).await?;
        parse_master_name(&output)
    }

    pub async fn management_names(
        &self,
        executor: &dyn CommandExecutor,
    ) -> ValidatorResult<Vec<String>> {
        let output = executor.execute(&self.management_query_command).await?;
        Ok(parse_management_names(&output, &self.management_marker))
    }

    /// 通过当前会话采集一次身份快照
    pub async fn capture_snapshot(
        &self,
        executor: &dyn CommandExecutor,
        sequence: u64,
    ) -> ValidatorResult<ClusterIdentitySnapshot> {
        let master_name = self.master_name(executor).await?;
        let management_names = self.management_names(executor).await?;
        debug!(master = %master_name, management = ?management_names, sequence, "采集集群身份快照");
        Ok(ClusterIdentitySnapshot::new(
            master_name,
            management_names,
            sequence,
        ))
    }
}

/// 从 `lsid` 输出中取出 `My master name is <name>` 中的主节点名
pub fn parse_master_name(output: &str) -> ValidatorResult<String> {
    output
        .lines()
        .find_map(|line| {
            let (_, rest) = line.split_once(MASTER_NAME_PREFIX)?;
            rest.split_whitespace().next()
        })
        .map(str::to_string)
        .ok_or_else(|| ValidatorError::parse("主节点名称 (My master name is <name>)", output))
}

/// 状态列表中主机名包含管理节点标记的节点
pub fn parse_management_names(output: &str, marker: &str) -> Vec<String> {
    tokenize(output)
        .into_iter()
        .map(|fields| fields[0])
        .filter(|hostname| hostname.contains(marker))
        .map(str::to_string)
        .collect()
}

/// 读取日志文件的修改时间（epoch秒）并记入 `probe.modified_at`
///
/// 返回本次读取之前记录的值；首次探测时为 `None`。
pub async fn probe_log_time(
    executor: &dyn CommandExecutor,
    probe: &mut LogProbe,
) -> ValidatorResult<Option<i64>> {
    let output = executor.execute(&probe.stat_command()).await?;
    let modified_at = output
        .trim()
        .parse::<i64>()
        .map_err(|_| ValidatorError::parse(format!("{} 的修改时间", probe.node_path), output))?;
    debug!(path = %probe.node_path, modified_at, "日志修改时间");
    Ok(probe.record(modified_at))
}
