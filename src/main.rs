use anyhow::Result;
use clap::Parser;
use cluster_validator::{exit_code, init_logging, load_config, Application, Cli};
use tracing::info;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    init_logging(&cli.log_level, &cli.log_format)?;
    info!("启动集群验证工具");

    let config = load_config(cli.config.as_deref())?;
    let app = Application::new(config);

    if let Err(e) = app.run(cli.command).await {
        std::process::exit(exit_code(&e));
    }

    info!("验证完成");
    Ok(())
}
