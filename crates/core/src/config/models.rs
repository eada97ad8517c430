use serde::{Deserialize, Serialize};

use super::validation::{ConfigValidator, ValidationUtils};
use crate::ValidatorResult;

const LSF_PROFILE: &str = "source /opt/ibm/lsf/conf/profile.lsf;";

/// 作业生命周期监控配置
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct JobMonitorConfig {
    /// 基础超时时间（秒），实际截止时间 = 基础超时 + sleep参数
    pub base_timeout_seconds: u64,
    /// 轮询间隔（秒）
    pub poll_interval_seconds: u64,
    /// 查询作业状态的命令
    pub status_command: String,
    /// 超时后取消作业的命令模板，`{job_id}` 会被替换
    pub kill_command: String,
    /// 管理员账户
    pub admin_user: String,
    /// 作业成功结束的状态关键字
    pub done_keyword: String,
}

impl Default for JobMonitorConfig {
    fn default() -> Self {
        Self {
            base_timeout_seconds: 300,
            poll_interval_seconds: 50,
            status_command: format!("{LSF_PROFILE} bjobs -a"),
            kill_command: "bkill {job_id}".to_string(),
            admin_user: "lsfadmin".to_string(),
            done_keyword: "DONE".to_string(),
        }
    }
}

impl ConfigValidator for JobMonitorConfig {
    fn validate(&self) -> ValidatorResult<()> {
        ValidationUtils::validate_seconds(
            self.base_timeout_seconds,
            "job.base_timeout_seconds",
            86_400,
        )?;
        ValidationUtils::validate_seconds(
            self.poll_interval_seconds,
            "job.poll_interval_seconds",
            3600,
        )?;
        ValidationUtils::validate_not_empty(&self.status_command, "job.status_command")?;
        ValidationUtils::validate_placeholder(&self.kill_command, "{job_id}", "job.kill_command")?;
        ValidationUtils::validate_not_empty(&self.admin_user, "job.admin_user")?;
        ValidationUtils::validate_not_empty(&self.done_keyword, "job.done_keyword")?;
        Ok(())
    }
}

/// 节点清单发现配置
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct RosterConfig {
    pub status_command: String,
    pub ok_keyword: String,
    /// 管理节点主机名中的角色标记
    pub management_marker: String,
    pub drain_timeout_seconds: u64,
    pub drain_poll_interval_seconds: u64,
}

impl Default for RosterConfig {
    fn default() -> Self {
        Self {
            status_command: "bhosts -w".to_string(),
            ok_keyword: "ok".to_string(),
            management_marker: "mgmt".to_string(),
            drain_timeout_seconds: 900,
            drain_poll_interval_seconds: 90,
        }
    }
}

impl ConfigValidator for RosterConfig {
    fn validate(&self) -> ValidatorResult<()> {
        ValidationUtils::validate_not_empty(&self.status_command, "roster.status_command")?;
        ValidationUtils::validate_not_empty(&self.ok_keyword, "roster.ok_keyword")?;
        ValidationUtils::validate_not_empty(&self.management_marker, "roster.management_marker")?;
        ValidationUtils::validate_seconds(
            self.drain_timeout_seconds,
            "roster.drain_timeout_seconds",
            86_400,
        )?;
        ValidationUtils::validate_seconds(
            self.drain_poll_interval_seconds,
            "roster.drain_poll_interval_seconds",
            3600,
        )?;
        Ok(())
    }
}

/// 主节点故障切换检测配置
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct FailoverConfig {
    pub master_query_command: String,
    pub management_query_command: String,
    pub shared_log_dir: String,
    /// 主节点上用于验证日志连续性的服务
    pub master_log_service: String,
    /// 其余管理节点上用于验证日志连续性的服务
    pub management_log_service: String,
    pub reboot_command: String,
    pub shutdown_command: String,
    pub reboot_settle_seconds: u64,
    pub shutdown_settle_seconds: u64,
    pub recovery_settle_seconds: u64,
}

impl Default for FailoverConfig {
    fn default() -> Self {
        Self {
            master_query_command: format!("{LSF_PROFILE} lsid"),
            management_query_command: format!("{LSF_PROFILE} bhosts -w -noheader"),
            shared_log_dir: "/mnt/lsf/log".to_string(),
            master_log_service: "mbatchd".to_string(),
            management_log_service: "lim".to_string(),
            reboot_command: "sudo su -l root -c 'shutdown -r now'".to_string(),
            shutdown_command: "sudo su -l root -c 'shutdown now'".to_string(),
            reboot_settle_seconds: 60,
            shutdown_settle_seconds: 120,
            recovery_settle_seconds: 60,
        }
    }
}

impl ConfigValidator for FailoverConfig {
    fn validate(&self) -> ValidatorResult<()> {
        ValidationUtils::validate_not_empty(
            &self.master_query_command,
            "failover.master_query_command",
        )?;
        ValidationUtils::validate_not_empty(
            &self.management_query_command,
            "failover.management_query_command",
        )?;
        ValidationUtils::validate_not_empty(&self.shared_log_dir, "failover.shared_log_dir")?;
        ValidationUtils::validate_not_empty(
            &self.master_log_service,
            "failover.master_log_service",
        )?;
        ValidationUtils::validate_not_empty(
            &self.management_log_service,
            "failover.management_log_service",
        )?;
        ValidationUtils::validate_not_empty(&self.reboot_command, "failover.reboot_command")?;
        ValidationUtils::validate_not_empty(&self.shutdown_command, "failover.shutdown_command")?;
        ValidationUtils::validate_seconds(
            self.reboot_settle_seconds,
            "failover.reboot_settle_seconds",
            3600,
        )?;
        ValidationUtils::validate_seconds(
            self.shutdown_settle_seconds,
            "failover.shutdown_settle_seconds",
            3600,
        )?;
        ValidationUtils::validate_seconds(
            self.recovery_settle_seconds,
            "failover.recovery_settle_seconds",
            3600,
        )?;
        Ok(())
    }
}

/// SSH连接配置（经由堡垒机跳转）
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct SshConfig {
    pub bastion_host: String,
    pub bastion_user: String,
    pub target_user: String,
    pub private_key_path: String,
    pub connect_timeout_seconds: u64,
}

impl Default for SshConfig {
    fn default() -> Self {
        Self {
            bastion_host: String::new(),
            bastion_user: "ubuntu".to_string(),
            target_user: "lsfadmin".to_string(),
            private_key_path: "~/.ssh/id_rsa".to_string(),
            connect_timeout_seconds: 30,
        }
    }
}

impl ConfigValidator for SshConfig {
    fn validate(&self) -> ValidatorResult<()> {
        // 堡垒机地址允许为空，此时直连目标节点
        ValidationUtils::validate_not_empty(&self.bastion_user, "ssh.bastion_user")?;
        ValidationUtils::validate_not_empty(&self.target_user, "ssh.target_user")?;
        ValidationUtils::validate_not_empty(&self.private_key_path, "ssh.private_key_path")?;
        ValidationUtils::validate_seconds(
            self.connect_timeout_seconds,
            "ssh.connect_timeout_seconds",
            600,
        )?;
        Ok(())
    }
}

/// 云平台命令行配置，用于重新启动已关机的节点
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct CloudConfig {
    pub instance_start_command: String,
    pub expected_start_output: String,
}

impl Default for CloudConfig {
    fn default() -> Self {
        Self {
            instance_start_command: "ibmcloud is instance-start {node}".to_string(),
            expected_start_output: "Creating action start for instance {node}".to_string(),
        }
    }
}

impl ConfigValidator for CloudConfig {
    fn validate(&self) -> ValidatorResult<()> {
        ValidationUtils::validate_placeholder(
            &self.instance_start_command,
            "{node}",
            "cloud.instance_start_command",
        )?;
        ValidationUtils::validate_not_empty(
            &self.expected_start_output,
            "cloud.expected_start_output",
        )?;
        Ok(())
    }
}

/// 作业内存规格
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobClass {
    Low,
    Med,
    High,
}

impl std::str::FromStr for JobClass {
    type Err = std::convert::Infallible;

    /// 无法识别的规格回退为 low
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s.to_lowercase().as_str() {
            "med" => JobClass::Med,
            "high" => JobClass::High,
            _ => JobClass::Low,
        })
    }
}

/// 按可用区和内存规格选择的作业提交命令
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct JobCatalogConfig {
    pub low: String,
    pub med: String,
    pub high: String,
    pub low_south: String,
    pub med_south: String,
    pub high_south: String,
    /// 可用区名称包含该字符串时使用 *_south 系列命令
    pub south_zone_marker: String,
}

impl Default for JobCatalogConfig {
    fn default() -> Self {
        let cmd = |family: &str, mem: u32| {
            format!(r#"bsub -J myjob[1-1] -R "select[family={family}] rusage[mem={mem}G]" sleep 90"#)
        };
        Self {
            low: cmd("mx2", 10),
            med: cmd("mx2", 30),
            high: cmd("mx2", 90),
            low_south: cmd("mx3d", 10),
            med_south: cmd("mx3d", 30),
            high_south: cmd("mx3d", 90),
            south_zone_marker: "us-south".to_string(),
        }
    }
}

impl JobCatalogConfig {
    pub fn command_for(&self, zone: &str, class: JobClass) -> &str {
        let south = zone.contains(&self.south_zone_marker);
        match (south, class) {
            (false, JobClass::Low) => &self.low,
            (false, JobClass::Med) => &self.med,
            (false, JobClass::High) => &self.high,
            (true, JobClass::Low) => &self.low_south,
            (true, JobClass::Med) => &self.med_south,
            (true, JobClass::High) => &self.high_south,
        }
    }
}

impl ConfigValidator for JobCatalogConfig {
    fn validate(&self) -> ValidatorResult<()> {
        for (name, cmd) in [
            ("jobs.low", &self.low),
            ("jobs.med", &self.med),
            ("jobs.high", &self.high),
            ("jobs.low_south", &self.low_south),
            ("jobs.med_south", &self.med_south),
            ("jobs.high_south", &self.high_south),
        ] {
            ValidationUtils::validate_placeholder(cmd, "sleep", name)?;
        }
        Ok(())
    }
}
