//! CloudFormation template generator

use anyhow::{bail, Context, Result};
use clap::Args;
use super::MISSING_CONFIG_HINT;
use dialoguer::Confirm;
use orcstack_config::StackConfig;
use orcstack_core::{provision, synthesize, ProvisionOutcome};
use std::fs;
use std::io::Write;
use std::path::PathBuf;
use tracing::info;

#[derive(Args)]
pub struct SynthArgs {
    /// Write the template to FILE instead of stdout
    #[arg(short, long, value_name = "FILE")]
    pub output: Option<PathBuf>,

    /// Overwrite an existing output file without asking
    #[arg(long)]
    pub force: bool,

    /// Exit successfully without writing anything when the bucket or artifact is missing
    #[arg(long)]
    pub allow_empty: bool,
}

pub fn run(args: SynthArgs, config: &StackConfig) -> Result<()> {
    let outcome = config.validate().context("Invalid configuration")?;

    let stack = match provision(&outcome)? {
        ProvisionOutcome::Declared(stack) => stack,
        ProvisionOutcome::Abandoned { .. } => {
            if args.allow_empty {
                return Ok(());
            }
            bail!(
                "Template not written. {} Pass --allow-empty to accept an empty result.",
                MISSING_CONFIG_HINT
            );
        }
    };

    let content = synthesize(&stack).to_json_pretty()?;

    let Some(output_path) = args.output else {
        let mut stdout = std::io::stdout().lock();
        writeln!(stdout, "{}", content).context("Failed to write template to stdout")?;
        return Ok(());
    };

    // Check if file exists
    if output_path.exists() && !args.force {
        let overwrite = Confirm::new()
            .with_prompt(format!(
                "{} already exists. Overwrite?",
                output_path.display()
            ))
            .default(false)
            .interact()?;
        if !overwrite {
            println!("Aborted.");
            return Ok(());
        }
    }

    fs::write(&output_path, format!("{}\n", content))
        .with_context(|| format!("Failed to write {}", output_path.display()))?;
    info!(path = %output_path.display(), "Wrote template");

    println!();
    println!("Created {}", output_path.display());
    println!();
    println!("Next steps:");
    println!("  1. Deploy:");
    println!("     aws cloudformation deploy \\");
    println!("       --template-file {} \\", output_path.display());
    println!("       --stack-name {} \\", stack.name);
    println!("       --capabilities CAPABILITY_IAM");
    println!();

    Ok(())
}
