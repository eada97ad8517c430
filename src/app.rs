use anyhow::{Context, Result};
use tracing::info;
use validator_core::{
    config::JobClass,
    models::{FailoverPlan, FailoverScenario, JobUser},
    SessionConnector, SessionGuard, ValidatorConfig,
};
use validator_engine::{FailoverDetector, JobLifecycleMonitor, NodeRosterDiscoverer};
use validator_infrastructure::{CliInstanceAction, SshConnector};

use crate::cli::Commands;

/// 验证应用，持有配置与会话获取器
pub struct Application {
    config: ValidatorConfig,
    connector: Box<dyn SessionConnector>,
}

impl Application {
    pub fn new(config: ValidatorConfig) -> Self {
        let connector = Box::new(SshConnector::new(config.ssh.clone()));
        Self::with_connector(config, connector)
    }

    pub fn with_connector(config: ValidatorConfig, connector: Box<dyn SessionConnector>) -> Self {
        Self { config, connector }
    }

    async fn open(&self, host: &str) -> Result<SessionGuard> {
        let session = self
            .connector
            .connect(host)
            .await
            .with_context(|| format!("连接节点失败: {host}"))?;
        Ok(SessionGuard::new(session))
    }

    /// 作业目录中按可用区与规格选出的提交命令
    pub fn job_command(&self, zone: &str, class: JobClass) -> &str {
        self.config.jobs.command_for(zone, class)
    }

    pub async fn run(&self, command: Commands) -> Result<()> {
        match command {
            Commands::Job {
                host,
                command,
                zone,
                class,
                ldap_user,
            } => {
                let submit = command.unwrap_or_else(|| self.job_command(&zone, class.into()).to_string());
                let user = ldap_user.map(JobUser::Ldap).unwrap_or(JobUser::Admin);
                let session = self.open(&host).await?;
                let monitor = JobLifecycleMonitor::new(self.config.job.clone());
                let report = monitor.run_and_await(&session, &submit, &user).await?;
                info!(
                    job_id = %report.job.id(),
                    polls = report.polls,
                    elapsed_secs = report.elapsed.as_secs(),
                    "作业验证通过"
                );
                println!("{}", serde_json::to_string_pretty(&report)?);
            }
            Commands::Nodes {
                host,
                exclude,
                static_addresses,
            } => {
                let session = self.open(&host).await?;
                let discoverer = NodeRosterDiscoverer::new(self.config.roster.clone());
                let addresses = discoverer
                    .discover_from_cluster(&session, exclude.as_deref(), &static_addresses)
                    .await?;
                for address in addresses {
                    println!("{address}");
                }
            }
            Commands::Drain {
                host,
                static_addresses,
            } => {
                let session = self.open(&host).await?;
                let discoverer = NodeRosterDiscoverer::new(self.config.roster.clone());
                let waited = discoverer
                    .wait_for_dynamic_nodes_to_drain(&session, &static_addresses)
                    .await?;
                info!(waited_secs = waited.as_secs(), "动态计算节点释放验证通过");
            }
            Commands::Failover {
                scenario,
                host,
                alternate,
                restore,
            } => {
                let plan = match FailoverScenario::from(scenario) {
                    FailoverScenario::Reboot => FailoverPlan::reboot(host.clone()),
                    FailoverScenario::Shutdown => FailoverPlan::shutdown(host.clone(), alternate),
                }
                .with_restore(restore);

                let session = self.open(&host).await?;
                let detector = FailoverDetector::new(self.config.failover.clone(), &self.config.roster);
                let action = CliInstanceAction::new(&self.config.failover, self.config.cloud.clone());
                let report = detector
                    .detect_failover(session, &action, &*self.connector, &plan)
                    .await?;
                println!("{}", serde_json::to_string_pretty(&report)?);
            }
            Commands::JobCommand { zone, class } => {
                println!("{}", self.job_command(&zone, class.into()));
            }
        }
        Ok(())
    }
}
