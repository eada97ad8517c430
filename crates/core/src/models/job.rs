use std::time::Duration;

use serde::{Deserialize, Serialize};

/// 作业在监控过程中的状态
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum JobState {
    #[serde(rename = "SUBMITTED")]
    Submitted,
    #[serde(rename = "POLLING")]
    Polling,
    #[serde(rename = "DONE")]
    Done,
    #[serde(rename = "TIMED_OUT")]
    TimedOut,
    #[serde(rename = "KILL_FAILED")]
    KillFailed,
}

impl JobState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, JobState::Done | JobState::TimedOut | JobState::KillFailed)
    }
}

/// 作业查询时匹配的用户身份
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JobUser {
    /// 集群管理员账户（取自配置）
    Admin,
    /// 通过LDAP登录的普通用户
    Ldap(String),
}

impl JobUser {
    pub fn token<'a>(&'a self, admin_user: &'a str) -> &'a str {
        match self {
            JobUser::Admin => admin_user,
            JobUser::Ldap(name) => name,
        }
    }
}

/// 一次提交的作业
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Job {
    id: String,
    pub submit_command: String,
    pub deadline: Duration,
    pub state: JobState,
}

impl Job {
    pub fn new(id: String, submit_command: String, deadline: Duration) -> Self {
        Self {
            id,
            submit_command,
            deadline,
            state: JobState::Submitted,
        }
    }

    /// 作业ID解析后不可修改
    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn transition(&mut self, next: JobState) {
        if !self.state.is_terminal() {
            self.state = next;
        }
    }
}

/// 作业成功结束后的监控报告
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobReport {
    pub job: Job,
    pub polls: u32,
    pub elapsed: Duration,
    /// 匹配到终态时的状态输出
    pub final_status: String,
}
