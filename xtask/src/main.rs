use anyhow::Result;
use clap::{Parser, Subcommand, ValueEnum};
use colored::*;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::time::Instant;

#[derive(Parser)]
#[command(name = "x")]
#[command(about = "Development automation for savebridge")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run all CI checks (fmt, clippy, build, test)
    Ci {
        #[arg(long)]
        verbose: bool,
    },
    /// Quick checks before commit (fmt, clippy)
    Check {
        #[arg(long)]
        verbose: bool,
    },
    /// Format code
    Fmt {
        #[arg(long)]
        check: bool,
    },
    /// Run clippy
    Clippy {
        #[arg(long)]
        fix: bool,
    },
    /// Build the project
    Build {
        #[arg(long)]
        release: bool,
    },
    /// Run tests
    Test {
        #[arg(long)]
        doc: bool,
        #[arg(long)]
        ignored: bool,
        /// Only run the unit tests of these modules (repeatable)
        #[arg(short, long, value_enum)]
        module: Vec<Module>,
        /// Only run the integration tests under tests/
        #[arg(long, conflicts_with = "module")]
        integration: bool,
    },
    /// Run benchmarks
    Bench,
    /// Drive the CLI end to end against a scratch store
    Smoke {
        /// Store directory (defaults to target/smoke-store)
        #[arg(long)]
        store: Option<PathBuf>,
        /// Build in release mode
        #[arg(long)]
        release: bool,
    },
    /// Pre-commit hook (fmt, clippy, test)
    PreCommit,
    /// Install git hooks
    InstallHooks,
}

#[derive(Clone, Copy, ValueEnum)]
enum Module {
    Classifier,
    Codec,
    SaveState,
    Memfs,
    Layout,
    Durable,
    Sync,
    Bridge,
    Headless,
    Config,
}

impl Module {
    fn path(self) -> &'static str {
        match self {
            Module::Classifier => "core::classifier",
            Module::Codec => "core::codec",
            Module::SaveState => "core::save_state",
            Module::Memfs => "core::memfs",
            Module::Layout => "core::layout",
            Module::Durable => "core::durable",
            Module::Sync => "core::sync",
            Module::Bridge => "core::bridge",
            Module::Headless => "core::headless",
            Module::Config => "core::config",
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Ci { verbose } => run_pipeline("Running CI Pipeline", "CI passed", CI_STEPS, verbose),
        Commands::Check { verbose } => {
            run_pipeline("Running Quick Checks", "Checks passed", CHECK_STEPS, verbose)
        }
        Commands::Fmt { check } => run_fmt(check),
        Commands::Clippy { fix } => run_clippy(fix),
        Commands::Build { release } => run_build(release),
        Commands::Test {
            doc,
            ignored,
            module,
            integration,
        } => run_test(doc, ignored, &module, integration),
        Commands::Bench => run_bench(),
        Commands::Smoke { store, release } => run_smoke(store, release),
        Commands::PreCommit => run_pipeline(
            "Pre-commit Checks",
            "Pre-commit checks passed",
            PRE_COMMIT_STEPS,
            false,
        ),
        Commands::InstallHooks => install_hooks(),
    }
}

type Step = (&'static str, fn() -> Result<()>);

const CI_STEPS: &[Step] = &[
    ("Format Check", || run_fmt(true)),
    ("Clippy", || run_clippy(false)),
    ("Build", || run_build(false)),
    ("Test", || run_test(false, false, &[], false)),
    ("Doc Test", || run_test(true, false, &[], false)),
];

const CHECK_STEPS: &[Step] = &[
    ("Format Check", || run_fmt(true)),
    ("Clippy", || run_clippy(false)),
];

const PRE_COMMIT_STEPS: &[Step] = &[
    ("Format Check", || run_fmt(true)),
    ("Clippy", || run_clippy(false)),
    ("Test", || run_test(false, false, &[], false)),
];

/// Run steps in order, stopping at the first failure
fn run_pipeline(title: &str, done: &str, steps: &[Step], verbose: bool) -> Result<()> {
    println!("{}", format!("=== {} ===", title).bold().blue());

    let start = Instant::now();
    for (name, step) in steps {
        run_task(name, step, verbose)?;
    }

    println!(
        "\n{} {}",
        format!("✓ {} in", done).green().bold(),
        format!("{:.2}s", start.elapsed().as_secs_f64()).bold()
    );
    Ok(())
}

fn run_fmt(check: bool) -> Result<()> {
    let mut cmd = Command::new("cargo");
    cmd.arg("fmt").arg("--all");

    if check {
        cmd.arg("--").arg("--check");
    }

    execute_command(&mut cmd)
}

fn run_clippy(fix: bool) -> Result<()> {
    let mut cmd = Command::new("cargo");
    cmd.arg("clippy").arg("--workspace").arg("--all-targets");

    if fix {
        cmd.arg("--fix");
    } else {
        cmd.arg("--").arg("-D").arg("warnings");
    }

    execute_command(&mut cmd)
}

fn run_build(release: bool) -> Result<()> {
    let mut cmd = Command::new("cargo");
    cmd.arg("build").arg("--workspace");

    if release {
        cmd.arg("--release");
    }

    execute_command(&mut cmd)
}

fn run_test(doc: bool, ignored: bool, modules: &[Module], integration: bool) -> Result<()> {
    let mut cmd = Command::new("cargo");
    cmd.arg("test").arg("-p").arg("savebridge");

    if doc {
        cmd.arg("--doc");
    } else if integration {
        cmd.arg("--test").arg("*");
    }

    if modules.is_empty() || doc {
        if ignored {
            cmd.arg("--").arg("--ignored");
        }
        return execute_command(&mut cmd);
    }

    // Module filters run one after another so a failure names its module
    let mut failed = Vec::new();

    for &module in modules {
        println!("{} Running {} tests...", "→".blue(), module.path().bold());

        let mut cmd = Command::new("cargo");
        cmd.arg("test")
            .arg("-p")
            .arg("savebridge")
            .arg("--lib")
            .arg(module.path());

        if ignored {
            cmd.arg("--").arg("--ignored");
        }

        match execute_command(&mut cmd) {
            Ok(_) => println!("{} {} tests passed\n", "✓".green(), module.path()),
            Err(_) => {
                println!("{} {} tests failed\n", "✗".red(), module.path());
                failed.push(module.path());
            }
        }
    }

    if failed.is_empty() {
        Ok(())
    } else {
        anyhow::bail!("Module tests failed: {}", failed.join(", "))
    }
}

fn run_bench() -> Result<()> {
    let mut cmd = Command::new("cargo");
    cmd.arg("bench").arg("-p").arg("savebridge");

    execute_command(&mut cmd)
}

fn savebridge(store: &Path, release: bool) -> Command {
    let mut cmd = Command::new("cargo");
    cmd.arg("run").arg("-q").arg("--bin").arg("savebridge");
    if release {
        cmd.arg("--release");
    }
    cmd.arg("--").arg("--store").arg(store);
    cmd
}

fn run_smoke(store: Option<PathBuf>, release: bool) -> Result<()> {
    use std::fs;

    println!("{}", "=== CLI Smoke Test ===".bold().blue());

    let store = store.unwrap_or_else(|| PathBuf::from("target/smoke-store"));
    let scratch = PathBuf::from("target/smoke-files");

    if store.exists() {
        fs::remove_dir_all(&store)?;
    }
    fs::create_dir_all(&scratch)?;

    let rom = scratch.join("smoke.gba");
    let cheats = scratch.join("smoke.cheats");
    let save_out = scratch.join("smoke-out.sav");
    fs::write(&rom, vec![0x2Eu8; 0xC0])?;
    fs::write(&cheats, "SMOKE1\nSMOKE2\n")?;
    fs::write(scratch.join("smoke.sav"), vec![0xA5u8; 64])?;

    println!("{} Store: {}", "→".blue(), store.display().to_string().cyan());
    println!(
        "{} Build mode: {}",
        "→".blue(),
        if release {
            "release".green().bold()
        } else {
            "debug".yellow().bold()
        }
    );
    println!();

    let start = Instant::now();

    run_task(
        "Ingest",
        || {
            execute_command(
                savebridge(&store, release)
                    .arg("ingest")
                    .arg(&rom)
                    .arg(&cheats)
                    .arg(scratch.join("smoke.sav")),
            )
        },
        true,
    )?;
    run_task(
        "Save state",
        || execute_command(savebridge(&store, release).args(["state", "save", "smoke.gba", "1"])),
        true,
    )?;
    run_task(
        "Load state (cheats only)",
        || {
            execute_command(savebridge(&store, release).args([
                "state", "load", "smoke.gba", "1", "--flags", "0x02",
            ]))
        },
        true,
    )?;
    run_task(
        "Get save",
        || {
            execute_command(
                savebridge(&store, release)
                    .args(["get-save", "smoke.gba", "-o"])
                    .arg(&save_out),
            )
        },
        true,
    )?;
    run_task(
        "List",
        || execute_command(savebridge(&store, release).args(["list", "--json"])),
        true,
    )?;

    if fs::read(&save_out)? != vec![0xA5u8; 64] {
        println!("\n{} Save round trip mismatch", "✗".red().bold());
        anyhow::bail!("save file read back does not match the upload");
    }

    let elapsed = start.elapsed();
    println!(
        "\n{} Smoke test completed in {}",
        "✓".green().bold(),
        format!("{:.2}s", elapsed.as_secs_f64()).bold()
    );

    Ok(())
}

fn install_hooks() -> Result<()> {
    use std::fs;

    println!("{}", "Installing git hooks...".bold());

    let hook_content = r#"#!/bin/sh
# Auto-generated by cargo x install-hooks
set -e

echo "Running pre-commit checks..."
cargo x pre-commit
"#;

    let hook_path = ".git/hooks/pre-commit";
    fs::write(hook_path, hook_content)?;

    // Make executable (Unix only)
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;

        let mut perms = fs::metadata(hook_path)?.permissions();
        perms.set_mode(0o755);
        fs::set_permissions(hook_path, perms)?;
    }

    println!("{}", "✓ Git hooks installed".green());
    println!("  Pre-commit hook will run: fmt, clippy, test");

    Ok(())
}

fn run_task<F>(name: &str, task: F, verbose: bool) -> Result<()>
where
    F: FnOnce() -> Result<()>,
{
    print!("{} {} ... ", "→".blue(), name);

    let start = Instant::now();

    match task() {
        Ok(_) => {
            let elapsed = start.elapsed();
            println!(
                "{} {}",
                "✓".green().bold(),
                if verbose {
                    format!("({:.2}s)", elapsed.as_secs_f64())
                } else {
                    String::new()
                }
            );
            Ok(())
        }
        Err(e) => {
            println!("{}", "✗".red().bold());
            Err(e)
        }
    }
}

fn execute_command(cmd: &mut Command) -> Result<()> {
    let status = cmd
        .stdout(Stdio::inherit())
        .stderr(Stdio::inherit())
        .status()?;

    if !status.success() {
        anyhow::bail!("Command failed with exit code: {}", status);
    }

    Ok(())
}
