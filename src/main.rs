use anyhow::Result;
use clap::Parser;
use orcstack::commands::Command;
use orcstack::CliOverrides;
use std::path::PathBuf;

/// Declare the ORC parser stack and render it as a CloudFormation template
#[derive(Parser)]
#[command(name = "orcstack")]
#[command(version)]
#[command(about = "Declare the ORC parser queue, function and table stack", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Path to configuration file
    #[arg(short, long, value_name = "FILE", global = true)]
    config: Option<PathBuf>,

    /// Bucket holding the function artifact (overrides ORC_DEPLOYMENT_BUCKET)
    #[arg(long, value_name = "BUCKET", global = true)]
    bucket: Option<String>,

    /// Object key of the function artifact (overrides ORC_JAR_NAME)
    #[arg(long, value_name = "KEY", global = true)]
    artifact: Option<String>,

    /// Stack name used in the template description and deploy hints
    #[arg(long, value_name = "NAME", global = true)]
    stack_name: Option<String>,

    /// Log level: trace, debug, info, warn, error
    #[arg(short = 'l', long, value_name = "LEVEL", global = true)]
    log_level: Option<String>,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let overrides = CliOverrides {
        config: cli.config,
        bucket: cli.bucket,
        artifact: cli.artifact,
        stack_name: cli.stack_name,
        log_level: cli.log_level,
    };

    let config = orcstack::load_config(&overrides)?;
    orcstack::init_tracing(&config);

    cli.command.run(&config)
}
