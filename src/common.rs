use anyhow::{Context, Result};
use tracing::error;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};
use validator_core::{ValidatorConfig, ValidatorError};

/// 初始化日志系统
pub fn init_logging(log_level: &str, log_format: &str) -> Result<()> {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_level));

    let registry = tracing_subscriber::registry().with(env_filter);

    match log_format {
        "json" => {
            registry
                .with(tracing_subscriber::fmt::layer().json())
                .try_init()
                .context("初始化JSON日志格式失败")?;
        }
        "pretty" => {
            registry
                .with(tracing_subscriber::fmt::layer().pretty())
                .try_init()
                .context("初始化Pretty日志格式失败")?;
        }
        _ => {
            return Err(anyhow::anyhow!("不支持的日志格式: {log_format}"));
        }
    }

    Ok(())
}

/// 加载验证配置
pub fn load_config(config_path: Option<&str>) -> Result<ValidatorConfig> {
    ValidatorConfig::load(config_path).with_context(|| match config_path {
        Some(path) => format!("加载配置文件失败: {path}"),
        None => "加载默认配置失败".to_string(),
    })
}

/// 配置类错误返回 2，其余验证失败返回 1
pub fn exit_code(e: &anyhow::Error) -> i32 {
    match e.downcast_ref::<ValidatorError>() {
        Some(err) if err.is_fatal() => {
            error!(kind = ?err.kind(), "配置错误, 请修正后重试: {e:#}");
            2
        }
        Some(err) => {
            error!(kind = ?err.kind(), "验证失败: {e:#}");
            1
        }
        None => {
            error!("执行失败: {e:#}");
            1
        }
    }
}
