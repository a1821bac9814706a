//! `portlint check` command

use anyhow::{Context, Result};

use portlint::util::Config;
use portlint::{perform_all_checks, LintContext, PackageSpec, PortPaths, Reporter, Verdict};

use crate::cli::CheckArgs;

pub fn execute(args: CheckArgs, color: bool) -> Result<()> {
    let spec: PackageSpec = args
        .spec
        .parse()
        .with_context(|| format!("invalid package spec: {}", args.spec))?;

    let config_path = args
        .config
        .unwrap_or_else(|| args.root.join("portlint.toml"));
    let config = Config::load_or_default(&config_path);

    let ctx = LintContext {
        spec,
        paths: PortPaths::from_root(&args.root),
        config,
    };

    let mut reporter = Reporter::stderr(color);
    let verdict = perform_all_checks(&ctx, &mut reporter)?;

    // A rejected package fails the invoking build step.
    if let Verdict::Rejected { .. } = verdict {
        std::process::exit(1);
    }

    Ok(())
}
