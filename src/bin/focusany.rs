//! FocusAny SDK command line.
//!
//! `focusany release-prepare [path]` switches a plugin's
//! `development.env` from `dev` to `prod` before packaging. `capabilities`
//! lists the host API the browser shim serves; `version` and `help` print what
//! they say.

use anyhow::{Context, Result, anyhow, bail};
use focusany_shim::capabilities::bindings;
use focusany_shim::release::{
    ConfigNotFound, ReleaseMode, ReleaseOutcome, missing_config_hints, prepare_release,
    resolve_config_path,
};
use focusany_shim::{
    CapabilityTable, HostApiCatalog, ShimConfig, UnsupportedPolicy, load_catalog_from_path,
};
use std::env;
use std::ffi::OsString;
use tracing_subscriber::EnvFilter;

fn main() {
    init_tracing();
    if let Err(err) = run() {
        eprintln!("{err:#}");
        std::process::exit(1);
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn run() -> Result<()> {
    let mut args = env::args_os().skip(1);
    let command = match args.next() {
        Some(raw) => utf8(raw)?,
        None => "help".to_string(),
    };
    match command.as_str() {
        "release-prepare" => {
            let custom = args.next().map(utf8).transpose()?;
            release_prepare(custom.as_deref().filter(|path| !path.is_empty()))
        }
        "capabilities" => capabilities(),
        "version" => {
            println!("FocusAny SDK Version: {}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
        "help" | "--help" | "-h" => {
            print!("{}", usage());
            Ok(())
        }
        other => {
            eprint!("{}", usage());
            bail!("Unknown command: {other}");
        }
    }
}

fn release_prepare(custom: Option<&str>) -> Result<()> {
    let cwd = env::current_dir()?;
    let path = resolve_config_path(&cwd, custom);

    println!("FocusAny SDK Release Prepare");
    if let Some(custom) = custom {
        println!("Using custom config file path: {custom}");
    }
    println!("Checking config file: {}", path.display());

    let outcome = match prepare_release(&path, ReleaseMode::Rewrite) {
        Ok(outcome) => outcome,
        Err(err) => {
            if err.downcast_ref::<ConfigNotFound>().is_some() {
                for hint in missing_config_hints(custom.is_some(), "focusany release-prepare") {
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
        ReleaseOutcome::AlreadyProduction | ReleaseOutcome::NeedsRewrite => println!(
            "Configuration check passed, env field is already set for production environment"
        ),
    }
    println!("Release prepare completed");
    Ok(())
}

/// Table of the host API as the shim would install it, honouring the
/// `FOCUSANY_SHIM_*` environment flags.
fn capabilities() -> Result<()> {
    let config = ShimConfig::from_env()?;
    let catalog = match &config.catalog_path {
        Some(path) => load_catalog_from_path(path)?,
        None => HostApiCatalog::embedded()?,
    };
    let table = CapabilityTable::build(&catalog, &bindings())
        .context("building capability table")?;

    let total = catalog.capabilities.len();
    let served = catalog
        .capabilities
        .iter()
        .filter(|entry| entry.policy.is_implemented())
        .count();
    println!("FocusAny host API {} ({total} capabilities)", table.key());
    for entry in &catalog.capabilities {
        let mode = if entry.is_async { "async" } else { "sync" };
        println!("  {:<36} {:<8} {mode}", entry.path, entry.policy.as_str());
    }
    let unsupported = match config.unsupported {
        UnsupportedPolicy::Lenient => "lenient",
        UnsupportedPolicy::Strict => "strict",
    };
    println!(
        "{served} served in the browser, {} stubbed; unsupported calls are {unsupported}",
        total - served
    );
    Ok(())
}

fn utf8(raw: OsString) -> Result<String> {
    raw.into_string()
        .map_err(|_| anyhow!("argument is not valid UTF-8"))
}

fn usage() -> &'static str {
    "FocusAny SDK CLI\n\
\n\
Usage:\n  focusany <command> [options]\n\
\n\
Commands:\n  release-prepare [path]  Check and update config.json for production release\n  capabilities            List the host API served or stubbed in the browser\n  version                 Display the current version of FocusAny SDK\n  help                    Show this help message\n\
\n\
Examples:\n  focusany release-prepare\n  focusany release-prepare path/to/config.json\n  focusany version\n"
}
