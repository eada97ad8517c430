use std::process::Stdio;

use async_trait::async_trait;
use tokio::process::Command;
use tracing::info;
use validator_core::{
    config::{CloudConfig, FailoverConfig},
    models::FailoverScenario,
    CommandExecutor, LifecycleAction, ValidatorError, ValidatorResult,
};

/// 节点生命周期操作
///
/// 重启/关机通过当前远程会话执行，启动通过本地云平台命令行执行。
#[derive(Debug, Clone)]
pub struct CliInstanceAction {
    reboot_command: String,
    shutdown_command: String,
    cloud: CloudConfig,
}

impl CliInstanceAction {
    pub fn new(failover: &FailoverConfig, cloud: CloudConfig) -> Self {
        Self {
            reboot_command: failover.reboot_command.clone(),
            shutdown_command: failover.shutdown_command.clone(),
            cloud,
        }
    }

    pub fn stop_command(&self, scenario: FailoverScenario) -> &str {
        match scenario {
            FailoverScenario::Reboot => &self.reboot_command,
            FailoverScenario::Shutdown => &self.shutdown_command,
        }
    }
}

#[async_trait]
impl LifecycleAction for CliInstanceAction {
    async fn stop(
        &self,
        session: &dyn CommandExecutor,
        node: &str,
        scenario: FailoverScenario,
    ) -> ValidatorResult<String> {
        let command = self.stop_command(scenario);
        info!(node = %node, scenario = %scenario, command = %command, "执行节点中断命令");
        session.execute(command).await
    }

    async fn start(&self, node: &str) -> ValidatorResult<()> {
        let command = self.cloud.instance_start_command.replace("{node}", node);
        let expected = self.cloud.expected_start_output.replace("{node}", node);
        let failed = |message: String| ValidatorError::TriggerFailed {
            node: node.to_string(),
            message,
        };

        info!(node = %node, command = %command, "启动节点");
        let output = Command::new("sh")
            .arg("-c")
            .arg(&command)
            .stdin(Stdio::null())
            .output()
            .await
            .map_err(|e| failed(format!("无法执行 '{command}': {e}")))?;

        let combined = format!(
            "{}{}",
            String::from_utf8_lossy(&output.stdout),
            String::from_utf8_lossy(&output.stderr)
        );
        if !output.status.success() {
            return Err(failed(format!(
                "'{command}' 退出状态 {}: {}",
                output.status,
                combined.trim()
            )));
        }
        if !combined.contains(&expected) {
            return Err(failed(format!(
                "输出中未找到 '{expected}': {}",
                combined.trim()
            )));
        }
        Ok(())
    }
}
