//! `larastan-dump` binary
//!
//! Regenerates `phpstan-larastan.neon` in the project root. Prints one
//! `  Updated <path>` line on success and exits non-zero on any error.

use anyhow::{anyhow, Result};
use clap::{ArgAction, Parser};
use ldump_core::paths::normalize;
use ldump_core::{
    ComposerRegistry, ConfigTransformer, DumpConfig, EncodeOptions, MissingPackagePolicy, Outcome,
    DEFAULT_ORIGIN_FILE, DEFAULT_PACKAGE, DEFAULT_TARGET_FILE,
};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::debug;
use tracing_subscriber::EnvFilter;

/// Regenerate phpstan-larastan.neon from Larastan's extension.neon
#[derive(Debug, Parser)]
#[command(name = "larastan-dump", version)]
struct Cli {
    /// Project root containing composer.json (defaults to the current directory)
    #[arg(long, env = "LARASTAN_DUMP_ROOT")]
    root: Option<PathBuf>,

    /// Composer package shipping extension.neon
    #[arg(long, default_value = DEFAULT_PACKAGE)]
    package: String,

    /// Configuration file inside the package directory
    #[arg(long, default_value = DEFAULT_ORIGIN_FILE)]
    origin: String,

    /// Output file, relative to the project root
    #[arg(long, default_value = DEFAULT_TARGET_FILE)]
    output: String,

    /// Spaces per indentation level
    #[arg(long, default_value_t = 4, value_parser = clap::value_parser!(u8).range(1..=16))]
    indent: u8,

    /// Indent with one tab per level instead of spaces
    #[arg(long, conflicts_with = "indent")]
    tabs: bool,

    /// Fail instead of skipping when the package is not installed
    #[arg(long)]
    require_package: bool,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = ArgAction::Count)]
    verbose: u8,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {err}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<()> {
    let cwd = std::env::current_dir()
        .map_err(|e| anyhow!("cannot determine current directory: {e}"))?;
    let root = normalize(&cli.root.map_or_else(|| cwd.clone(), |root| cwd.join(root)));
    debug!(root = %root.display(), "project root");

    // Error messages already carry the offending path
    let registry = ComposerRegistry::discover(&root)?;

    let policy = if cli.require_package {
        MissingPackagePolicy::Fail
    } else {
        MissingPackagePolicy::Skip
    };
    let encode = if cli.tabs {
        EncodeOptions::new().with_indent("\t")
    } else {
        EncodeOptions::spaces(cli.indent.into())
    };
    let config = DumpConfig::new(root)
        .with_package(cli.package)
        .with_origin_file(cli.origin)
        .with_target_file(cli.output)
        .with_encode_options(encode)
        .with_missing_package(policy);

    match ConfigTransformer::new(config, registry).run()? {
        Outcome::Updated { target, .. } => println!("  Updated {}", target.display()),
        Outcome::Skipped { .. } => {}
    }

    Ok(())
}

/// Logs go to stderr; stdout carries only the confirmation line
fn init_tracing(verbose: u8) {
    let default_level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn defaults_match_core() {
        let cli = Cli::try_parse_from(["larastan-dump"]).unwrap();

        assert_eq!(cli.package, DEFAULT_PACKAGE);
        assert_eq!(cli.origin, DEFAULT_ORIGIN_FILE);
        assert_eq!(cli.output, DEFAULT_TARGET_FILE);
        assert_eq!(cli.indent, 4);
        assert!(!cli.require_package);
    }

    #[test]
    fn indent_is_bounded() {
        assert!(Cli::try_parse_from(["larastan-dump", "--indent", "0"]).is_err());
        assert!(Cli::try_parse_from(["larastan-dump", "--indent", "2"]).is_ok());
    }

    #[test]
    fn tabs_conflict_with_explicit_indent() {
        assert!(Cli::try_parse_from(["larastan-dump", "--tabs"]).is_ok());
        assert!(Cli::try_parse_from(["larastan-dump", "--tabs", "--indent", "2"]).is_err());
    }

    #[test]
    fn counts_verbosity() {
        let cli = Cli::try_parse_from(["larastan-dump", "-vv"]).unwrap();
        assert_eq!(cli.verbose, 2);
    }
}
