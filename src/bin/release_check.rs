//! Standalone release gate for plugin bundles.
//!
//! Same check as `focusany release-prepare`. With `--check-only` the config
//! is never written and a `dev` environment fails the run, which suits CI.

use anyhow::{Result, anyhow, bail};
use focusany_shim::release::{
    ConfigNotFound, ReleaseMode, ReleaseOutcome, missing_config_hints, prepare_release,
    resolve_config_path,
};
use std::env;
use tracing_subscriber::EnvFilter;

fn main() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    if let Err(err) = run() {
        eprintln!("{err:#}");
        std::process::exit(1);
    }
}

struct CliArgs {
    mode: ReleaseMode,
    custom: Option<String>,
}

impl CliArgs {
    fn parse() -> Result<Self> {
        let mut mode = ReleaseMode::Rewrite;
        let mut custom = None;
        for arg_os in env::args_os().skip(1) {
            let arg = arg_os
                .into_string()
                .map_err(|_| anyhow!("argument is not valid UTF-8"))?;
            match arg.as_str() {
                "--check-only" => mode = ReleaseMode::CheckOnly,
                "--help" | "-h" => {
                    print!("{}", usage());
                    std::process::exit(0);
                }
                flag if flag.starts_with("--") => bail!("unknown flag: {flag}"),
                "" => {}
                path => {
                    if custom.is_some() {
                        bail!("only one config path may be given");
                    }
                    custom = Some(path.to_string());
                }
            }
        }
        Ok(Self { mode, custom })
    }
}

fn run() -> Result<()> {
    let args = CliArgs::parse()?;
    let cwd = env::current_dir()?;
    let path = resolve_config_path(&cwd, args.custom.as_deref());

    println!("FocusAny SDK Release Check");
    if let Some(custom) = &args.custom {
        println!("Using custom config file path: {custom}");
    }
    println!("Checking config file: {}", path.display());

    let outcome = match prepare_release(&path, args.mode) {
        Ok(outcome) => outcome,
        Err(err) => {
            if err.downcast_ref::<ConfigNotFound>().is_some() {
                for hint in missing_config_hints(args.custom.is_some(), "focusany-release-check") {
                    eprintln!("{hint}");
                }
            }
            return Err(err);
        }
    };
    match outcome {
        ReleaseOutcome::Rewritten => {
            eprintln!(r#"Detected env field in config.json is "dev", it has been changed to "prod""#);
            println!("Configuration file has been updated");
        }
        ReleaseOutcome::AlreadyProduction => println!(
            "Configuration check passed, env field is already set for production environment"
        ),
        ReleaseOutcome::NeedsRewrite => {
            bail!(r#"env field in {} is "dev"; rerun without --check-only to switch it to "prod""#, path.display())
        }
    }
    println!("Release check completed");
    Ok(())
}

fn usage() -> &'static str {
    "Usage: focusany-release-check [--check-only] [path]\n\
Checks development.env in the plugin config (default: dist/config.json) and switches \"dev\" to \"prod\".\n\
With --check-only the file is never written and a \"dev\" environment exits 1.\n"
}
