use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// 某一时刻集群管理节点身份的快照
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ClusterIdentitySnapshot {
    pub master_name: String,
    pub management_names: Vec<String>,
    /// 逻辑序号，只用于快照先后排序
    pub captured_at: u64,
    pub observed_at: DateTime<Utc>,
}

impl ClusterIdentitySnapshot {
    pub fn new(master_name: String, mut management_names: Vec<String>, captured_at: u64) -> Self {
        management_names.sort();
        management_names.dedup();
        Self {
            master_name,
            management_names,
            captured_at,
            observed_at: Utc::now(),
        }
    }

    /// 除主节点外的管理节点
    pub fn standby_names(&self) -> Vec<String> {
        self.management_names
            .iter()
            .filter(|name| **name != self.master_name)
            .cloned()
            .collect()
    }

    pub fn same_management_set(&self, other: &ClusterIdentitySnapshot) -> bool {
        self.management_names == other.management_names
    }
}
