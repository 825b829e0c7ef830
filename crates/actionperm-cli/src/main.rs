mod display;

use actionperm_core::config::{Config, DEFAULT_CONFIG_FILE};
use actionperm_core::pipeline::{self, Analysis};
use actionperm_core::providers::GitHubClient;
use actionperm_core::source::{GitHubRepository, LocalCheckout};
use actionperm_core::token::scan_token_signals;
use actionperm_core::{ActionRef, OctokitExtractor};
use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use std::path::{Path, PathBuf};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(
    name = "actionperm",
    version,
    about = "actionperm — least-privilege GITHUB_TOKEN permissions for GitHub Actions",
    long_about = "Analyze a third-party GitHub Action and infer the GITHUB_TOKEN permissions it needs.\n\nThe result is an action-security.yml manifest that workflow tooling can use to set minimal permissions."
)]
struct Cli {
    /// Log filter (e.g. warn, info, actionperm_core=debug)
    #[arg(long, global = true, default_value = "warn")]
    log_level: String,

    /// Path to the configuration file
    #[arg(long, global = true, default_value = DEFAULT_CONFIG_FILE)]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, ValueEnum)]
enum OutputFormat {
    /// action-security.yml only
    Text,
    /// Full analysis as JSON
    Json,
    /// Markdown analysis report
    Report,
}

#[derive(Subcommand)]
enum Commands {
    /// Analyze an action hosted on GitHub
    Analyze {
        /// owner/repo[/path], or a "[KB] Add KB for owner/repo" issue title
        action: String,

        /// GitHub token used for API requests
        #[arg(long, env = "GITHUB_TOKEN", hide_env_values = true)]
        token: Option<String>,

        #[arg(short, long, value_enum, default_value = "text")]
        format: OutputFormat,

        /// Knowledge-base root; the manifest is written below it
        #[arg(long)]
        kb_dir: Option<PathBuf>,

        /// Re-analyze even if the knowledge base already has this action
        #[arg(long)]
        force: bool,
    },

    /// Analyze an action checked out on disk
    Local {
        /// Root of the action's repository
        path: PathBuf,

        /// owner/repo[/path] the checkout corresponds to
        #[arg(long)]
        name: String,

        /// Top language, instead of detecting it from file extensions
        #[arg(long)]
        language: Option<String>,

        #[arg(short, long, value_enum, default_value = "text")]
        format: OutputFormat,

        /// Knowledge-base root; the manifest is written below it
        #[arg(long)]
        kb_dir: Option<PathBuf>,
    },

    /// List token references found in a file
    Tokens {
        file: PathBuf,
    },

    /// Write a starter configuration file
    InitConfig {
        #[arg(default_value = DEFAULT_CONFIG_FILE)]
        path: PathBuf,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = EnvFilter::try_new(&cli.log_level).unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_writer(std::io::stderr),
        )
        .init();

    match cli.command {
        Commands::Analyze { action, token, format, kb_dir, force } => {
            let config = load_config(&cli.config)?;
            cmd_analyze(&action, token, format, kb_dir.as_deref(), force, &config)
        }
        Commands::Local { path, name, language, format, kb_dir } => {
            let config = load_config(&cli.config)?;
            cmd_local(&path, &name, language, format, kb_dir.as_deref(), &config)
        }
        Commands::Tokens { file } => cmd_tokens(&file),
        Commands::InitConfig { path } => cmd_init_config(&path),
    }
}

fn load_config(path: &Path) -> Result<Config> {
    let config = Config::load(path).with_context(|| format!("Failed to load {}", path.display()))?;
    tracing::debug!(path = %path.display(), "configuration loaded");
    Ok(config)
}

fn cmd_analyze(
    action: &str,
    token: Option<String>,
    format: OutputFormat,
    kb_dir: Option<&Path>,
    force: bool,
    config: &Config,
) -> Result<()> {
    let action: ActionRef = action.parse()?;

    if let Some(kb_dir) = kb_dir {
        let existing = action.kb_manifest_path(kb_dir);
        if existing.exists() && !force {
            display::print_already_analyzed(&action, &existing);
            return Ok(());
        }
    }

    let client = GitHubClient::new(token, &config.github.api_url)?;
    let repo = GitHubRepository::new(client, action.clone())?;
    let analysis = pipeline::analyze(&repo, &action, config, &OctokitExtractor)
        .with_context(|| format!("Failed to analyze {}", action))?;

    emit(&analysis, format, kb_dir)
}

fn cmd_local(
    path: &Path,
    name: &str,
    language: Option<String>,
    format: OutputFormat,
    kb_dir: Option<&Path>,
    config: &Config,
) -> Result<()> {
    let action = ActionRef::parse(name)?;
    let mut checkout = LocalCheckout::new(path)?;
    if let Some(language) = language {
        checkout = checkout.with_language(language);
    }

    let analysis = pipeline::analyze(&checkout, &action, config, &OctokitExtractor)
        .with_context(|| format!("Failed to analyze {}", path.display()))?;

    emit(&analysis, format, kb_dir)
}

fn emit(analysis: &Analysis, format: OutputFormat, kb_dir: Option<&Path>) -> Result<()> {
    match format {
        OutputFormat::Text => print!("{}", analysis.manifest.render()),
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(analysis)?),
        OutputFormat::Report => print!("{}", actionperm_core::report::render_markdown(analysis)),
    }

    display::print_summary(analysis);

    if let Some(kb_dir) = kb_dir {
        let out_path = analysis.action.kb_manifest_path(kb_dir);
        if let Some(parent) = out_path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }
        std::fs::write(&out_path, analysis.manifest.render())
            .with_context(|| format!("Failed to write {}", out_path.display()))?;
        display::print_written(&out_path);
    }

    Ok(())
}

fn cmd_tokens(file: &Path) -> Result<()> {
    let content = std::fs::read_to_string(file)
        .with_context(|| format!("Failed to read {}", file.display()))?;
    let signals = scan_token_signals(&content);
    display::print_signals(file, &signals);
    Ok(())
}

fn cmd_init_config(path: &Path) -> Result<()> {
    if path.exists() {
        anyhow::bail!("'{}' already exists", path.display());
    }
    std::fs::write(path, Config::starter_toml())
        .with_context(|| format!("Failed to write {}", path.display()))?;
    println!("Config written to {}", path.display());
    Ok(())
}
