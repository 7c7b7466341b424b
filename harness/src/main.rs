//! Single-shot script harness.
//!
//! Runs one bundled script against input from the environment and prints a
//! single JSON envelope, or decodes such an envelope on the caller's side.

use std::io::{self, Read};
use std::path::PathBuf;

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use harness::exit_codes;
use harness::io::config::{HarnessConfig, load_config};
use harness::io::output::parse_execution_output;
use harness::run::run_from_env;
use harness::{logging, scripts};

#[derive(Parser)]
#[command(
    name = "harness",
    version,
    about = "Run a script once and report its logs, result and error as one JSON line"
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run a bundled script with input from the environment.
    Run {
        /// Script name (see `harness list`).
        script: String,
        /// TOML config file; missing file means defaults.
        #[arg(long, default_value = "harness.toml")]
        config: PathBuf,
        /// Also forward captured output to stdout as it is written.
        #[arg(long)]
        show_logs: bool,
        /// Minimum captured log severity (trace, debug, info, warn, error, off).
        #[arg(long)]
        threshold: Option<String>,
        /// Environment variable holding the JSON input.
        #[arg(long)]
        input_var: Option<String>,
    },
    /// List bundled scripts.
    List,
    /// Decode captured harness stdout (read from stdin) into an execution result.
    Parse,
}

fn main() {
    logging::init();
    match run() {
        Ok(code) => std::process::exit(code),
        Err(err) => {
            eprintln!("{:#}", err);
            std::process::exit(exit_codes::INVALID);
        }
    }
}

fn run() -> Result<i32> {
    let cli = Cli::parse();
    match cli.command {
        Command::Run {
            script,
            config,
            show_logs,
            threshold,
            input_var,
        } => {
            let mut cfg = load_config(&config)?;
            apply_overrides(&mut cfg, show_logs, threshold, input_var)?;
            cmd_run(&script, &cfg)
        }
        Command::List => cmd_list(),
        Command::Parse => cmd_parse(),
    }
}

fn apply_overrides(
    cfg: &mut HarnessConfig,
    show_logs: bool,
    threshold: Option<String>,
    input_var: Option<String>,
) -> Result<()> {
    if show_logs {
        cfg.capture.show_logs = true;
    }
    if let Some(threshold) = threshold {
        cfg.capture.threshold = threshold;
    }
    if let Some(input_var) = input_var {
        cfg.input_var = input_var;
    }
    cfg.validate()
}

fn cmd_run(name: &str, cfg: &HarnessConfig) -> Result<i32> {
    let Some(script) = scripts::find(name) else {
        bail!("unknown script {name:?} (see `harness list`)");
    };
    run_from_env(script, cfg, Box::new(io::stdout())).context("write envelope")?;
    Ok(exit_codes::OK)
}

fn cmd_list() -> Result<i32> {
    for script in scripts::catalog() {
        println!("{:<12} {}", script.name(), script.summary());
    }
    Ok(exit_codes::OK)
}

fn cmd_parse() -> Result<i32> {
    let mut stdout = Vec::new();
    io::stdin()
        .read_to_end(&mut stdout)
        .context("read captured output from stdin")?;
    let parsed = parse_execution_output(&stdout, &[])?;
    let mut payload = serde_json::to_string_pretty(&parsed).context("serialize result")?;
    payload.push('\n');
    print!("{payload}");
    if parsed.success {
        Ok(exit_codes::OK)
    } else {
        Ok(exit_codes::SCRIPT_ERROR)
    }
}
