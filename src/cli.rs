use clap::{Parser, Subcommand, ValueEnum};
use validator_core::{config::JobClass, models::FailoverScenario};

/// 命令行主结构
#[derive(Parser, Debug)]
#[command(name = "cluster-validator")]
#[command(version = "1.0.0")]
#[command(about = "集群部署后验证工具")]
#[command(long_about = "在已部署的集群上执行作业生命周期、计算节点清单与主节点故障切换验证")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// 配置文件路径（缺省时按默认路径查找）
    #[arg(short, long, global = true)]
    pub config: Option<String>,

    /// 日志级别
    #[arg(short, long, global = true, default_value = "info",
          value_parser = ["trace", "debug", "info", "warn", "error"])]
    pub log_level: String,

    /// 日志格式
    #[arg(long, global = true, default_value = "pretty", value_parser = ["json", "pretty"])]
    pub log_format: String,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// 提交作业并等待完成
    Job {
        /// 登录节点地址
        #[arg(long)]
        host: String,
        /// 作业提交命令（缺省时按可用区与规格从作业目录中选择）
        #[arg(long)]
        command: Option<String>,
        /// 可用区
        #[arg(long, default_value = "")]
        zone: String,
        /// 内存规格
        #[arg(long, value_enum, default_value_t = ClassArg::Low)]
        class: ClassArg,
        /// 以LDAP用户身份匹配作业状态
        #[arg(long)]
        ldap_user: Option<String>,
    },
    /// 发现计算节点地址
    Nodes {
        #[arg(long)]
        host: String,
        /// 排除主机名包含该标记的节点
        #[arg(long)]
        exclude: Option<String>,
        /// 静态计算节点地址
        #[arg(long = "static", value_name = "IP")]
        static_addresses: Vec<String>,
    },
    /// 等待动态计算节点释放
    Drain {
        #[arg(long)]
        host: String,
        #[arg(long = "static", value_name = "IP")]
        static_addresses: Vec<String>,
    },
    /// 主节点故障切换检测
    Failover {
        #[arg(long, value_enum)]
        scenario: ScenarioArg,
        /// 管理节点入口地址
        #[arg(long)]
        host: String,
        /// 关机后优先尝试的备用管理节点地址
        #[arg(long, value_name = "IP")]
        alternate: Vec<String>,
        /// 关机场景结束后启动原主节点并验证回切
        #[arg(long)]
        restore: bool,
    },
    /// 输出作业目录中的提交命令
    JobCommand {
        #[arg(long, default_value = "")]
        zone: String,
        #[arg(long, value_enum, default_value_t = ClassArg::Low)]
        class: ClassArg,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ClassArg {
    Low,
    Med,
    High,
}

impl From<ClassArg> for JobClass {
    fn from(value: ClassArg) -> Self {
        match value {
            ClassArg::Low => JobClass::Low,
            ClassArg::Med => JobClass::Med,
            ClassArg::High => JobClass::High,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ScenarioArg {
    Reboot,
    Shutdown,
}

impl From<ScenarioArg> for FailoverScenario {
    fn from(value: ScenarioArg) -> Self {
        match value {
            ScenarioArg::Reboot => FailoverScenario::Reboot,
            ScenarioArg::Shutdown => FailoverScenario::Shutdown,
        }
    }
}
