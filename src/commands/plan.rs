//! Human-readable summary of the declared stack

use anyhow::{Context, Result};
use clap::Args;
use orcstack_config::StackConfig;
use super::MISSING_CONFIG_HINT;
use orcstack_core::{provision, ProvisionOutcome, Stack};
use std::fmt::Write as _;

#[derive(Args)]
pub struct PlanArgs {
    /// Also list the IAM actions behind each grant
    #[arg(long)]
    pub actions: bool,
}

pub fn run(args: PlanArgs, config: &StackConfig) -> Result<()> {
    let outcome = config.validate().context("Invalid configuration")?;

    match provision(&outcome)? {
        ProvisionOutcome::Declared(stack) => print!("{}", render(&stack, args.actions)),
        ProvisionOutcome::Abandoned { .. } => println!("Nothing to plan. {}", MISSING_CONFIG_HINT),
    }

    Ok(())
}

/// Render the stack summary shown by `orcstack plan`.
pub fn render(stack: &Stack, with_actions: bool) -> String {
    let mut out = String::new();
    let function = &stack.function;

    // Writing to a String cannot fail
    let _ = writeln!(out, "Stack: {}", stack.name);
    let _ = writeln!(out);
    let _ = writeln!(out, "Resources:");
    let _ = writeln!(
        out,
        "  bucket reference  {:<24} {} (looked up, not created)",
        stack.bucket.logical_id, stack.bucket.name
    );
    let _ = writeln!(
        out,
        "  table             {:<24} partition key {} ({})",
        stack.table.logical_id,
        stack.table.partition_key.name,
        stack.table.partition_key.attribute_type.code()
    );
    let _ = writeln!(
        out,
        "  queue             {:<24} {}, visibility {}s",
        stack.queue.logical_id,
        stack.queue.name,
        stack.queue.visibility_timeout.as_secs()
    );
    let _ = writeln!(
        out,
        "  function          {:<24} {}, {} MB, timeout {}s, handler {}",
        function.logical_id,
        function.runtime.as_str(),
        function.memory_mb,
        function.timeout.as_secs(),
        function.handler
    );
    let _ = writeln!(
        out,
        "  code              s3://{}/{}",
        function.code.bucket, function.code.key
    );
    let _ = writeln!(
        out,
        "  trigger           {} -> {} (batch size {})",
        stack.event_source.queue, stack.event_source.function, stack.event_source.batch_size
    );

    let _ = writeln!(out);
    let _ = writeln!(out, "Grants:");
    for grant in stack.grants() {
        let _ = writeln!(out, "  {}", grant);
        if with_actions {
            let _ = writeln!(out, "      {}", grant.actions().join(", "));
        }
    }

    out
}
