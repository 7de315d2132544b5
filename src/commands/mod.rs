//! Stack commands - render or summarize the declared stack

pub mod plan;
pub mod synth;

use clap::Subcommand;
use orcstack_config::StackConfig;

/// Shown after the missing-config warning; the warning itself names the fields.
const MISSING_CONFIG_HINT: &str =
    "Set ORC_DEPLOYMENT_BUCKET and ORC_JAR_NAME, or pass --bucket and --artifact.";

#[derive(Subcommand)]
pub enum Command {
    /// Write the CloudFormation template for the stack
    Synth(synth::SynthArgs),
    /// Print the resources and grants the stack would declare
    Plan(plan::PlanArgs),
}

impl Command {
    pub fn run(self, config: &StackConfig) -> anyhow::Result<()> {
        match self {
            Command::Synth(args) => synth::run(args, config),
            Command::Plan(args) => plan::run(args, config),
        }
    }
}
