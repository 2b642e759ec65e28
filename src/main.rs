use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use miette::{IntoDiagnostic, Result};
use tracing_subscriber::EnvFilter;

use crivo_core::{CrivoConfig, Severity};
use crivo_review::llm::LlmClient;
use crivo_review::runner::{Outcome, Runner};

const CONFIG_FILE: &str = ".crivo.toml";

#[derive(Parser)]
#[command(
    name = "crivo",
    version,
    about = "AI code review for pull-request CI artifacts",
    long_about = "Reviews a pull request from artifacts produced by earlier CI steps.\n\n\
                   Reads changed-files.txt, pr-diff.txt, typecheck-output.txt and\n\
                   eslint-output.json from the working directory, asks the model for a\n\
                   structured review, and writes review-result.json with a markdown\n\
                   summary and one inline comment per issue.\n\n\
                   Examples:\n  \
                     crivo                          Review artifacts in the current directory\n  \
                     crivo --workdir ci/artifacts   Review artifacts elsewhere\n  \
                     crivo --fail-on critical       Fail the job on critical findings\n  \
                     crivo init                     Create a .crivo.toml config file"
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,

    /// Path to configuration file (default: <workdir>/.crivo.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Directory holding the CI artifacts
    #[arg(long, global = true, default_value = ".")]
    workdir: PathBuf,

    /// Write the result here instead of <workdir>/review-result.json
    #[arg(long)]
    output: Option<PathBuf>,

    /// Override the model identifier
    #[arg(long)]
    model: Option<String>,

    /// Exit with non-zero code if findings meet severity threshold
    #[arg(
        long,
        long_help = "Exit with status 1 when the written counters meet this severity.\n\n\
                     critical: critical_count > 0\n\
                     high (or lower): critical_count + high_count > 0\n\
                     The result file is written either way."
    )]
    fail_on: Option<Severity>,

    /// Enable debug logging
    #[arg(long, short, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Command {
    /// Create a default .crivo.toml in the working directory
    Init,
}

const DEFAULT_CONFIG: &str = r#"# crivo configuration
# Every key is optional; the values below are the defaults.

[llm]
# model = "claude-sonnet-4-20250514"
# api_key_env = "ANTHROPIC_API_KEY"
# base_url = "https://api.anthropic.com"
# max_tokens = 8000
# temperature = 0.2
# timeout_secs = 600

[review]
# extensions = [".ts", ".tsx", ".js", ".jsx", ".py", ".sql"]
# max_prompt_files = 20
# max_diff_chars = 50000
# max_typecheck_chars = 5000
# max_lint_chars = 3000
# summary_issue_limit = 10
# Recompute critical/high/medium counters from the issue list
# recount_severities = false

[artifacts]
# changed_files = "changed-files.txt"
# diff = "pr-diff.txt"
# typecheck = "typecheck-output.txt"
# lint = "eslint-output.json"
# output = "review-result.json"
"#;

fn init_tracing(verbose: bool) {
    let default = if verbose {
        "crivo=debug,crivo_review=debug,crivo_core=debug,warn"
    } else {
        "warn"
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn load_config(explicit: Option<&Path>, workdir: &Path) -> Result<CrivoConfig> {
    match explicit {
        Some(path) => Ok(CrivoConfig::from_file(path)?),
        None => {
            let default_path = workdir.join(CONFIG_FILE);
            if default_path.exists() {
                Ok(CrivoConfig::from_file(&default_path)?)
            } else {
                Ok(CrivoConfig::default())
            }
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    miette::set_hook(Box::new(|_| {
        Box::new(
            miette::MietteHandlerOpts::new()
                .terminal_links(true)
                .build(),
        )
    }))
    .expect("miette handler");
    human_panic::setup_panic!();

    let cli = Cli::parse();
    init_tracing(cli.verbose);

    if let Some(Command::Init) = cli.command {
        let path = cli.workdir.join(CONFIG_FILE);
        if path.exists() {
            miette::bail!(miette::miette!(
                help = "Edit the existing file or remove it first",
                "{} already exists",
                path.display()
            ));
        }
        std::fs::write(&path, DEFAULT_CONFIG).into_diagnostic()?;
        println!("Created {}", path.display());
        return Ok(());
    }

    let mut config = load_config(cli.config.as_deref(), &cli.workdir)?;
    if let Some(model) = cli.model {
        config.llm.model = model;
    }

    // The credential is required even when no file changed.
    let client = LlmClient::from_config(&config.llm)?;
    tracing::debug!(model = client.model(), workdir = %cli.workdir.display(), "starting review");

    let mut runner = Runner::new(client, config, &cli.workdir);
    if let Some(output) = cli.output {
        runner = runner.with_output(output);
    }
    let report = runner.run().await?;

    if report.outcome == Outcome::Analyzed {
        println!();
        println!("{report}");
    }

    if let Some(threshold) = cli.fail_on {
        if report.meets(threshold) {
            std::process::exit(1);
        }
    }

    Ok(())
}
