use serde::{Deserialize, Serialize};

/// 节点健康状态
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NodeStatus {
    Ok,
    Unreachable,
    Closed,
    Other(String),
}

impl NodeStatus {
    /// 状态关键字区分大小写，仅精确匹配 `ok_keyword` 视为健康
    pub fn from_keyword(keyword: &str, ok_keyword: &str) -> Self {
        if keyword == ok_keyword {
            return NodeStatus::Ok;
        }
        match keyword {
            "unreach" => NodeStatus::Unreachable,
            "closed" => NodeStatus::Closed,
            other => NodeStatus::Other(other.to_string()),
        }
    }
}

/// 集群状态列表中的一行节点记录
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeRecord {
    pub raw_hostname: String,
    pub status: NodeStatus,
    /// 从主机名推导出的地址，去重以此为准
    pub address: Option<String>,
}

impl NodeRecord {
    pub fn is_ok(&self) -> bool {
        self.status == NodeStatus::Ok
    }
}
