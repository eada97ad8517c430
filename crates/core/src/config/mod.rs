pub mod models;
pub mod validation;

use std::path::Path;

use config::{Config as ConfigBuilder, Environment, File, FileFormat};
use serde::{Deserialize, Serialize};

pub use models::{
    CloudConfig, FailoverConfig, JobCatalogConfig, JobClass, JobMonitorConfig, RosterConfig,
    SshConfig,
};
pub use validation::{ConfigValidator, ValidationUtils};

use crate::{ValidatorError, ValidatorResult};

const DEFAULT_CONFIG_PATHS: [&str; 3] = [
    "config/validator.toml",
    "validator.toml",
    "/etc/cluster-validator/config.toml",
];

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ValidatorConfig {
    pub job: JobMonitorConfig,
    pub roster: RosterConfig,
    pub failover: FailoverConfig,
    pub ssh: SshConfig,
    pub cloud: CloudConfig,
    pub jobs: JobCatalogConfig,
}

impl ValidatorConfig {
    /// 按 默认值 -> 配置文件 -> VALIDATOR__* 环境变量 的顺序叠加配置
    pub fn load(config_path: Option<&str>) -> ValidatorResult<Self> {
        let mut builder =
            ConfigBuilder::builder().add_source(ConfigBuilder::try_from(&Self::default())?);

        if let Some(path) = config_path {
            if !Path::new(path).exists() {
                return Err(ValidatorError::config_error(format!("配置文件不存在: {path}")));
            }
            builder = builder.add_source(File::new(path, FileFormat::Toml));
        } else if let Some(path) = DEFAULT_CONFIG_PATHS
            .iter()
            .find(|path| Path::new(path).exists())
        {
            builder = builder.add_source(File::new(path, FileFormat::Toml));
        }

        builder = builder.add_source(
            Environment::with_prefix("VALIDATOR")
                .prefix_separator("__")
                .separator("__")
                .try_parsing(true),
        );

        let config: ValidatorConfig = builder.build()?.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_toml(toml_str: &str) -> ValidatorResult<Self> {
        let config: ValidatorConfig = toml::from_str(toml_str)?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_toml(&self) -> ValidatorResult<String> {
        Ok(toml::to_string_pretty(self)?)
    }
}

impl ConfigValidator for ValidatorConfig {
    fn validate(&self) -> ValidatorResult<()> {
        self.job.validate()?;
        self.roster.validate()?;
        self.failover.validate()?;
        self.ssh.validate()?;
        self.cloud.validate()?;
        self.jobs.validate()?;
        Ok(())
    }
}
