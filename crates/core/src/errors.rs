use std::time::Duration;

use thiserror::Error;

/// 错误大类，调用方据此判断失败性质而不必解析消息文本
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// 远程命令或连接本身失败
    Transport,
    /// 输出结构不符合预期
    Parse,
    /// 到达截止时间仍未进入终态
    TimedOut,
    /// 集群行为违反了验证不变量
    InvariantViolation,
    /// 配置错误
    Configuration,
}

/// 验证引擎错误类型定义
#[derive(Debug, Error)]
pub enum ValidatorError {
    #[error("作业提交失败: '{command}' - {message}")]
    Submission { command: String, message: String },

    #[error("远程命令执行失败: '{command}' - {message}")]
    Transport { command: String, message: String },

    #[error("远程会话已断开: '{command}'")]
    SessionLost { command: String },

    #[error("连接节点失败: {target} - {message}")]
    Connection { target: String, message: String },

    #[error("节点生命周期操作失败: {node} - {message}")]
    TriggerFailed { node: String, message: String },

    #[error("输出解析失败: 期望{expected}, 原始输出: {raw}")]
    Parse { expected: String, raw: String },

    #[error("作业 {job_id} 执行超时, 已耗时 {elapsed:?}")]
    TimedOut { job_id: String, elapsed: Duration },

    #[error("提交输出中未找到作业ID: {raw}")]
    NoJobId { raw: String },

    #[error("无效的作业命令: '{command}' - {reason}")]
    MalformedCommand { command: String, reason: String },

    #[error("未发现任何计算节点 (动态或静态)")]
    NoNodesFound,

    #[error("主节点未发生切换: 之前 {previous}, 当前 {current}")]
    FailoverDidNotOccur { previous: String, current: String },

    #[error("主节点未恢复: 期望 {expected}, 实际 {actual}")]
    FailoverDidNotRevert { expected: String, actual: String },

    #[error("日志文件未更新: {path} (之前 {before}, 之后 {after})")]
    LogNotUpdated { path: String, before: i64, after: i64 },

    #[error("配置错误: {0}")]
    Configuration(String),
}

/// 统一的Result类型
pub type ValidatorResult<T> = std::result::Result<T, ValidatorError>;

impl ValidatorError {
    pub fn transport<C: Into<String>, M: ToString>(command: C, message: M) -> Self {
        Self::Transport {
            command: command.into(),
            message: message.to_string(),
        }
    }

    pub fn parse<E: Into<String>, R: Into<String>>(expected: E, raw: R) -> Self {
        Self::Parse {
            expected: expected.into(),
            raw: raw.into(),
        }
    }

    pub fn connection<T: Into<String>, M: ToString>(target: T, message: M) -> Self {
        Self::Connection {
            target: target.into(),
            message: message.to_string(),
        }
    }

    pub fn config_error<S: Into<String>>(msg: S) -> Self {
        Self::Configuration(msg.into())
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Submission { .. }
            | Self::Transport { .. }
            | Self::SessionLost { .. }
            | Self::Connection { .. }
            | Self::TriggerFailed { .. } => ErrorKind::Transport,
            Self::Parse { .. } => ErrorKind::Parse,
            Self::TimedOut { .. } => ErrorKind::TimedOut,
            Self::NoJobId { .. }
            | Self::MalformedCommand { .. }
            | Self::NoNodesFound
            | Self::FailoverDidNotOccur { .. }
            | Self::FailoverDidNotRevert { .. }
            | Self::LogNotUpdated { .. } => ErrorKind::InvariantViolation,
            Self::Configuration(_) => ErrorKind::Configuration,
        }
    }

    /// 会话断开是重启/关机触发后的预期结果
    pub fn is_session_lost(&self) -> bool {
        matches!(self, Self::SessionLost { .. })
    }

    /// 调用方可以换一个节点或稍后重新调用
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::Transport { .. } | Self::SessionLost { .. } | Self::Connection { .. }
        )
    }

    /// 配置错误重试无意义，需要先修正配置
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::Configuration(_))
    }
}

impl From<config::ConfigError> for ValidatorError {
    fn from(err: config::ConfigError) -> Self {
        ValidatorError::Configuration(err.to_string())
    }
}

impl From<std::io::Error> for ValidatorError {
    fn from(err: std::io::Error) -> Self {
        ValidatorError::Transport {
            command: String::new(),
            message: err.to_string(),
        }
    }
}

impl From<toml::de::Error> for ValidatorError {
    fn from(err: toml::de::Error) -> Self {
        ValidatorError::Configuration(err.to_string())
    }
}

impl From<toml::ser::Error> for ValidatorError {
    fn from(err: toml::ser::Error) -> Self {
        ValidatorError::Configuration(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = ValidatorError::TimedOut {
            job_id: "12345".to_string(),
            elapsed: Duration::from_secs(390),
        };
        assert_eq!(err.to_string(), "作业 12345 执行超时, 已耗时 390s");

        let err = ValidatorError::LogNotUpdated {
            path: "/mnt/lsf/log/mgmt-1/mbatchd.log.mgmt-1".to_string(),
            before: 1000,
            after: 1000,
        };
        assert!(err.to_string().contains("之前 1000, 之后 1000"));
    }

    #[test]
    fn test_error_kind_classification() {
        assert_eq!(
            ValidatorError::transport("bjobs -a", "connection reset").kind(),
            ErrorKind::Transport
        );
        assert_eq!(
            ValidatorError::SessionLost {
                command: "reboot".to_string()
            }
            .kind(),
            ErrorKind::Transport
        );
        assert_eq!(
            ValidatorError::parse("master name", "").kind(),
            ErrorKind::Parse
        );
        assert_eq!(ValidatorError::NoNodesFound.kind(), ErrorKind::InvariantViolation);
        assert_eq!(
            ValidatorError::NoJobId { raw: "x".to_string() }.kind(),
            ErrorKind::InvariantViolation
        );
        assert_eq!(
            ValidatorError::config_error("bad").kind(),
            ErrorKind::Configuration
        );
    }

    #[test]
    fn test_retryable_and_fatal() {
        assert!(ValidatorError::connection("10.0.0.1", "refused").is_retryable());
        assert!(!ValidatorError::NoNodesFound.is_retryable());
        assert!(ValidatorError::config_error("bad").is_fatal());
        assert!(!ValidatorError::transport("ls", "boom").is_fatal());
        assert!(ValidatorError::SessionLost {
            command: "shutdown now".to_string()
        }
        .is_session_lost());
    }
}
