//! Developer tasks for the k3d package
//!
//! ```bash
//! cargo xtask build --release
//! cargo xtask test
//! cargo xtask lint
//! cargo xtask ci
//! ```

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use xshell::{cmd, Shell};

const PACKAGE: &str = "k3d";

#[derive(Parser)]
#[command(name = "xtask", about = "Developer tasks for k3d")]
struct Cli {
    #[command(subcommand)]
    task: Task,
}

#[derive(Subcommand)]
enum Task {
    /// Build the k3d binary and print its path
    Build {
        #[arg(long)]
        release: bool,
    },
    /// Run the k3d test suite, optionally filtered by test name
    Test {
        filter: Option<String>,
    },
    /// rustfmt check and clippy with warnings denied
    Lint,
    /// lint, test, then a release build
    Ci,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let sh = Shell::new()?;
    sh.change_dir(workspace_root()?);

    match cli.task {
        Task::Build { release } => {
            let binary = build(&sh, release)?;
            println!("{}", binary.display());
        }
        Task::Test { filter } => test(&sh, filter.as_deref())?,
        Task::Lint => lint(&sh)?,
        Task::Ci => {
            lint(&sh)?;
            test(&sh, None)?;
            let binary = build(&sh, true)?;
            println!("ci passed, release binary at {}", binary.display());
        }
    }

    Ok(())
}

/// The xtask crate sits one level below the workspace root
fn workspace_root() -> Result<PathBuf> {
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .parent()
        .map(Path::to_path_buf)
        .context("xtask has no parent directory")
}

fn build(sh: &Shell, release: bool) -> Result<PathBuf> {
    let profile: &[&str] = if release { &["--release"] } else { &[] };
    cmd!(sh, "cargo build -p {PACKAGE} --bin {PACKAGE} {profile...}").run()?;

    let dir = if release { "release" } else { "debug" };
    let binary = sh.current_dir().join("target").join(dir).join(PACKAGE);
    if !binary.exists() {
        bail!("expected binary at {}", binary.display());
    }
    Ok(binary)
}

fn test(sh: &Shell, filter: Option<&str>) -> Result<()> {
    let filter: Vec<&str> = filter.into_iter().collect();
    cmd!(sh, "cargo test -p {PACKAGE} {filter...}").run()?;
    Ok(())
}

fn lint(sh: &Shell) -> Result<()> {
    cmd!(sh, "cargo fmt --all -- --check").run()?;
    cmd!(sh, "cargo clippy -p {PACKAGE} --all-targets -- -D warnings").run()?;
    Ok(())
}
