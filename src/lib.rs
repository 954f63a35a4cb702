// src/lib.rs

pub mod cli;
pub mod clock;
pub mod config;
pub mod errors;
pub mod fs;
pub mod logging;
pub mod naming;
pub mod pipeline;
pub mod relocate;
pub mod timeout;
pub mod watch;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Result;
use tokio::runtime::Handle;
use tracing::{debug, info};

use crate::cli::CliArgs;
use crate::config::loader::load_and_validate;
use crate::pipeline::{Disposition, Pipeline};
use crate::relocate::Relocator;
use crate::timeout::FileActionTimeout;
use crate::watch::{EventRelay, NameFilter, TriggerMask, WatchTarget, spawn_watch};

/// A watch target together with what the binary should do on new files.
#[derive(Debug, Clone)]
pub struct ResolvedTarget {
    pub target: WatchTarget,
    pub disposition: Disposition,
}

/// High-level entry point used by `main.rs`.
///
/// This wires together:
/// - config loading (or the ad-hoc `--path` target)
/// - one relay + relocation pipeline per target
/// - one watch session per target
/// - Ctrl-C handling
pub async fn run(args: CliArgs) -> Result<()> {
    let (targets, timeout) = resolve_targets(&args)?;

    if args.dry_run {
        print_dry_run(&targets, timeout);
        return Ok(());
    }

    let relocator = Relocator::system();
    let runtime = Handle::current();

    let mut handles = Vec::with_capacity(targets.len());
    for resolved in targets {
        let relay = Arc::new(EventRelay::new());
        Pipeline::new(relocator.clone(), resolved.disposition, timeout)
            .attach(&relay, runtime.clone());
        handles.push(spawn_watch(resolved.target, relay)?);
    }

    info!(targets = handles.len(), "dirwatch running; press Ctrl-C to stop");
    tokio::signal::ctrl_c().await?;
    info!("shutdown requested");

    for handle in handles {
        debug!(path = ?handle.path(), "stopping watch");
        handle.shutdown().await?;
    }

    Ok(())
}

/// Turn CLI flags or the config file into concrete watch targets.
pub fn resolve_targets(args: &CliArgs) -> Result<(Vec<ResolvedTarget>, FileActionTimeout)> {
    if let Some(path) = &args.path {
        let triggers = if args.triggers.is_empty() {
            TriggerMask::all()
        } else {
            args.triggers.iter().copied().collect()
        };
        let filter = match args.filter.as_deref() {
            Some(spec) => NameFilter::parse(spec)?,
            None => NameFilter::match_all(),
        };
        let target = WatchTarget::new(path)
            .with_triggers(triggers)
            .with_filter(filter)
            .recursive(args.recursive);

        let resolved = ResolvedTarget {
            target,
            disposition: args.on_created,
        };
        return Ok((vec![resolved], FileActionTimeout::default_budget()));
    }

    let cfg = load_and_validate(&args.config)?;
    let base_dir = config_root_dir(&args.config);

    let targets = cfg
        .target
        .iter()
        .map(|t| {
            Ok(ResolvedTarget {
                target: t.to_watch_target(&base_dir)?,
                disposition: t.on_created,
            })
        })
        .collect::<crate::errors::Result<Vec<_>>>()?;

    Ok((targets, cfg.action_timeout()))
}

/// Directory that relative target paths are resolved against.
///
/// - If the config path has a non-empty parent (e.g. "configs/Dirwatch.toml"),
///   we use that directory.
/// - If it's just a bare filename like "Dirwatch.toml" (parent = ""),
///   we fall back to the current working directory "."
fn config_root_dir(config_path: &Path) -> PathBuf {
    match config_path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")),
    }
}

fn print_dry_run(targets: &[ResolvedTarget], timeout: FileActionTimeout) {
    println!("dirwatch dry-run");
    match timeout.budget() {
        Some(budget) => println!("  action timeout = {budget:?}"),
        None => println!("  action timeout = none"),
    }
    println!();

    println!("targets ({}):", targets.len());
    for resolved in targets {
        let target = &resolved.target;
        println!("  - {}", target.path().display());
        println!("      triggers: {:?}", target.triggers());
        if !target.filter().matches_all() {
            println!("      filter: {:?}", target.filter().patterns());
        }
        if target.is_recursive() {
            println!("      recursive: true");
        }
        println!("      on_created: {:?}", resolved.disposition);
    }

    debug!("dry-run complete (no watching)");
}
