use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::EnvFilter;

use shadow_switch::fixture::compute;
use shadow_switch::{GuardStyle, MutantId, ResolutionMode, SwitchConfig, install};

#[derive(Debug, Parser)]
#[command(name = "shadow-compute")]
#[command(about = "Reference host program with one instrumented change")]
struct Cli {
    /// First operand.
    #[arg(allow_negative_numbers = true)]
    a: i64,
    /// Second operand.
    #[arg(allow_negative_numbers = true)]
    b: i64,
    /// Resolution mode (old, new, dual, mutation). Defaults to the build profile.
    #[arg(long, value_parser = parse_mode)]
    mode: Option<ResolutionMode>,
    /// Guard emission style (opaque, constant). Defaults to the build profile.
    #[arg(long, value_parser = parse_guards)]
    guards: Option<GuardStyle>,
    /// Active mutant id. Defaults to SHADOW_SWITCH_MUTANT_ID, then baseline.
    #[arg(long)]
    mutant: Option<u32>,
    /// Environment flag read by the DUAL fallback.
    #[arg(long)]
    old_version_flag: Option<String>,
    /// Emit selection hook events at trace level.
    #[arg(long)]
    trace_hooks: bool,
}

fn parse_mode(raw: &str) -> Result<ResolutionMode, shadow_switch::SwitchError> {
    raw.parse()
}

fn parse_guards(raw: &str) -> Result<GuardStyle, shadow_switch::SwitchError> {
    raw.parse()
}

fn make_config(cli: &Cli) -> Result<SwitchConfig> {
    let mut config = SwitchConfig::from_env().context("reading harness environment")?;
    if let Some(mode) = cli.mode {
        config = config.with_mode(mode);
        if cli.guards.is_none() {
            config = config.with_guards(GuardStyle::default_for(mode));
        }
    }
    if let Some(guards) = cli.guards {
        config = config.with_guards(guards);
    }
    if let Some(mutant) = cli.mutant {
        config = config.with_active_mutant(MutantId(mutant));
    }
    if let Some(flag) = &cli.old_version_flag {
        config = config.with_old_version_flag(flag.clone());
    }
    Ok(config.with_trace_hooks(cli.trace_hooks))
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = make_config(&cli)?;
    tracing::debug!(?config, "resolved switch configuration");
    let context = config
        .build_context()
        .context("building execution context")?;
    let context = install(context).context("installing execution context")?;

    let result = compute(context, cli.a, cli.b);
    println!("The result is: {result}");
    Ok(())
}
