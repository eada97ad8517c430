use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;

use async_trait::async_trait;
use tempfile::TempDir;
use tokio::process::{Child, Command};
use tokio::time::{sleep, Instant};
use tracing::{debug, info, warn};
use validator_core::{
    config::SshConfig, CommandExecutor, RemoteSession, SessionConnector, ValidatorError,
    ValidatorResult,
};

/// ssh 在连接中断或无法建立连接时的退出码
const SSH_CONNECTION_EXIT_CODE: i32 = 255;

const READY_POLL_INTERVAL: Duration = Duration::from_millis(500);

/// 基于 OpenSSH ControlMaster 的会话获取器
///
/// 每个会话启动一个主连接进程（可经由堡垒机跳转），
/// 之后的命令通过控制套接字复用该连接。
#[derive(Debug, Clone)]
pub struct SshConnector {
    config: SshConfig,
}

impl SshConnector {
    pub fn new(config: SshConfig) -> Self {
        Self { config }
    }

    fn private_key(&self) -> PathBuf {
        expand_home(&self.config.private_key_path)
    }

    /// 主连接进程参数
    pub fn master_args(&self, target: &str, socket: &Path) -> Vec<String> {
        let mut args = vec![
            "-N".to_string(),
            "-M".to_string(),
            "-S".to_string(),
            socket.display().to_string(),
            "-i".to_string(),
            self.private_key().display().to_string(),
        ];
        args.extend(common_options(self.config.connect_timeout_seconds));
        if !self.config.bastion_host.is_empty() {
            args.push("-J".to_string());
            args.push(format!(
                "{}@{}",
                self.config.bastion_user, self.config.bastion_host
            ));
        }
        args.push(format!("{}@{}", self.config.target_user, target));
        args
    }

    async fn wait_until_ready(
        &self,
        target: &str,
        socket: &Path,
        master: &mut Child,
    ) -> ValidatorResult<()> {
        let timeout = Duration::from_secs(self.config.connect_timeout_seconds);
        let started = Instant::now();

        loop {
            if let Some(status) = master
                .try_wait()
                .map_err(|e| ValidatorError::connection(target, e))?
            {
                return Err(ValidatorError::connection(
                    target,
                    format!("ssh 主连接进程提前退出: {status}"),
                ));
            }

            let check = Command::new("ssh")
                .arg("-S")
                .arg(socket)
                .arg("-O")
                .arg("check")
                .arg(format!("{}@{}", self.config.target_user, target))
                .stdin(Stdio::null())
                .stdout(Stdio::null())
                .stderr(Stdio::null())
                .status()
                .await
                .map_err(|e| ValidatorError::connection(target, e))?;
            if check.success() {
                return Ok(());
            }

            if started.elapsed() >= timeout {
                return Err(ValidatorError::connection(
                    target,
                    format!("{}秒内未能建立连接", timeout.as_secs()),
                ));
            }
            sleep(READY_POLL_INTERVAL).await;
        }
    }
}

#[async_trait]
impl SessionConnector for SshConnector {
    async fn connect(&self, target: &str) -> ValidatorResult<Box<dyn RemoteSession>> {
        let control_dir = tempfile::Builder::new()
            .prefix("validator-ssh-")
            .tempdir()
            .map_err(|e| ValidatorError::connection(target, e))?;
        let socket = control_dir.path().join("control.sock");

        debug!(target = %target, bastion = %self.config.bastion_host, "启动ssh主连接");
        let mut master = Command::new("ssh")
            .args(self.master_args(target, &socket))
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| ValidatorError::connection(target, format!("启动ssh失败: {e}")))?;

        if let Err(e) = self.wait_until_ready(target, &socket, &mut master).await {
            if let Err(kill_err) = terminate_master(&mut master) {
                warn!(target = %target, error = %kill_err, "结束ssh主连接失败");
            }
            return Err(e);
        }

        info!(target = %target, "已建立ssh会话");
        Ok(Box::new(SshSession {
            target: target.to_string(),
            login: format!("{}@{}", self.config.target_user, target),
            socket,
            master,
            _control_dir: control_dir,
        }))
    }
}

/// 复用主连接执行命令的ssh会话
pub struct SshSession {
    target: String,
    login: String,
    socket: PathBuf,
    master: Child,
    _control_dir: TempDir,
}

impl std::fmt::Debug for SshSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SshSession")
            .field("target", &self.target)
            .field("socket", &self.socket)
            .finish()
    }
}

#[async_trait]
impl CommandExecutor for SshSession {
    async fn execute(&self, command: &str) -> ValidatorResult<String> {
        debug!(target = %self.target, command = %command, "执行远程命令");
        let output = Command::new("ssh")
            .arg("-S")
            .arg(&self.socket)
            .args(["-o", "BatchMode=yes"])
            .arg(&self.login)
            .arg("--")
            .arg(command)
            .stdin(Stdio::null())
            .output()
            .await
            .map_err(|e| ValidatorError::transport(command, e))?;

        let stdout = String::from_utf8_lossy(&output.stdout).into_owned();
        let stderr = String::from_utf8_lossy(&output.stderr).into_owned();
        classify_exit(command, output.status.code(), stdout, &stderr)
    }
}

impl RemoteSession for SshSession {
    fn target(&self) -> &str {
        &self.target
    }

    fn close(&mut self) -> ValidatorResult<()> {
        terminate_master(&mut self.master).map_err(|e| {
            warn!(target = %self.target, error = %e, "结束ssh主连接失败");
            e
        })
    }
}

/// 结束仍在运行的主连接进程，已退出的进程视为成功
fn terminate_master(master: &mut Child) -> ValidatorResult<()> {
    match master.try_wait() {
        Ok(Some(_)) => Ok(()),
        _ => master
            .start_kill()
            .map_err(|e| ValidatorError::transport("kill ssh master", e)),
    }
}

/// 按退出码区分成功、会话中断与普通命令失败
pub fn classify_exit(
    command: &str,
    code: Option<i32>,
    stdout: String,
    stderr: &str,
) -> ValidatorResult<String> {
    match code {
        Some(0) => Ok(stdout),
        Some(SSH_CONNECTION_EXIT_CODE) | None => Err(ValidatorError::SessionLost {
            command: command.to_string(),
        }),
        Some(code) => {
            let detail = if stderr.trim().is_empty() {
                stdout.trim().to_string()
            } else {
                stderr.trim().to_string()
            };
            Err(ValidatorError::transport(
                command,
                format!("退出码 {code}: {detail}"),
            ))
        }
    }
}

fn common_options(connect_timeout_seconds: u64) -> Vec<String> {
    [
        "BatchMode=yes".to_string(),
        "StrictHostKeyChecking=no".to_string(),
        "UserKnownHostsFile=/dev/null".to_string(),
        "ServerAliveInterval=15".to_string(),
        "ServerAliveCountMax=2".to_string(),
        format!("ConnectTimeout={connect_timeout_seconds}"),
    ]
    .into_iter()
    .flat_map(|option| ["-o".to_string(), option])
    .collect()
}

fn expand_home(path: &str) -> PathBuf {
    match (path.strip_prefix("~/"), std::env::var_os("HOME")) {
        (Some(rest), Some(home)) => Path::new(&home).join(rest),
        _ => PathBuf::from(path),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use validator_core::ErrorKind;

    #[tokio::test]
    async fn test_terminate_master_kills_running_process_once() {
        let mut child = Command::new("sleep")
            .arg("30")
            .kill_on_drop(true)
            .spawn()
            .unwrap();

        terminate_master(&mut child).unwrap();
        let status = child.wait().await.unwrap();
        assert!(!status.success());

        // 已退出的进程不再发送信号
        terminate_master(&mut child).unwrap();
    }

    #[test]
    fn test_master_args_with_bastion() {
        let connector = SshConnector::new(SshConfig {
            bastion_host: "169.48.1.10".to_string(),
            private_key_path: "/keys/id_rsa".to_string(),
            ..SshConfig::default()
        });
        let args = connector.master_args("10.241.0.4", Path::new("/tmp/x/control.sock"));

        assert_eq!(&args[..4], ["-N", "-M", "-S", "/tmp/x/control.sock"]);
        assert!(args.windows(2).any(|w| w == ["-i", "/keys/id_rsa"]));
        assert!(args.windows(2).any(|w| w == ["-J", "ubuntu@169.48.1.10"]));
        assert!(args.contains(&"ConnectTimeout=30".to_string()));
        assert_eq!(args.last().map(String::as_str), Some("lsfadmin@10.241.0.4"));
    }

    #[test]
    fn test_master_args_direct() {
        let connector = SshConnector::new(SshConfig::default());
        let args = connector.master_args("10.241.0.4", Path::new("/tmp/s"));
        assert!(!args.contains(&"-J".to_string()));
    }

    #[test]
    fn test_classify_exit() {
        assert_eq!(
            classify_exit("hostname", Some(0), "mgmt-1\n".to_string(), "").unwrap(),
            "mgmt-1\n"
        );

        let lost = classify_exit("reboot", Some(255), String::new(), "Connection closed").unwrap_err();
        assert!(lost.is_session_lost());
        assert!(classify_exit("reboot", None, String::new(), "").unwrap_err().is_session_lost());

        let failed = classify_exit("bjobs -a", Some(1), String::new(), "No job found\n").unwrap_err();
        assert_eq!(failed.kind(), ErrorKind::Transport);
        assert!(failed.to_string().contains("No job found"));
        assert!(!failed.is_session_lost());
    }

    #[test]
    fn test_expand_home() {
        assert_eq!(expand_home("/abs/key"), PathBuf::from("/abs/key"));
        if let Some(home) = std::env::var_os("HOME") {
            assert_eq!(expand_home("~/.ssh/id_rsa"), Path::new(&home).join(".ssh/id_rsa"));
        }
    }
}
