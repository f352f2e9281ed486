//! CLI command definitions, routing, and tracing setup.

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use color_eyre::eyre::{Result, eyre};
use ogetheory_core::assembler::{export_filename, make_full_html, write_export};
use ogetheory_core::catalog::Catalog;
use ogetheory_markup::text;
use ogetheory_shared::{AppConfig, BucketKey, ContentItem, init_config, load_config};
use tracing::{info, warn};

/// Shown when the selected item has no markup body.
const NO_CONTENT_WARNING: &str = "Нет содержимого для выбранного навыка.";

// ---------------------------------------------------------------------------
// CLI structure
// ---------------------------------------------------------------------------

/// ogetheory — OGE math theory by exam task.
#[derive(Parser)]
#[command(
    name = "ogetheory",
    version,
    about = "Browse OGE math theory by exam task, render it as HTML, export it as text.",
    long_about = None,
)]
pub(crate) struct Cli {
    /// Log format: text (default) or json.
    #[arg(long, default_value = "text", global = true)]
    pub log_format: LogFormat,

    /// Verbosity level (-v, -vv, -vvv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Theory dataset (overrides `data.theory_path`).
    #[arg(long, env = "OGETHEORY_THEORY", global = true)]
    pub theory: Option<PathBuf>,

    /// Taxonomy dataset (overrides `data.taxonomy_path`).
    #[arg(long, env = "OGETHEORY_TAXONOMY", global = true)]
    pub taxonomy: Option<PathBuf>,

    /// Fuzzy match threshold, 0–100 (overrides `matching.threshold`).
    #[arg(long, global = true)]
    pub threshold: Option<f64>,

    #[command(subcommand)]
    pub command: Command,
}

/// Log output format.
#[derive(Clone, Debug, clap::ValueEnum)]
pub(crate) enum LogFormat {
    Text,
    Json,
}

/// Top-level CLI subcommands.
#[derive(Subcommand)]
pub(crate) enum Command {
    /// List task buckets with their item counts.
    Tasks,

    /// List the skills in a task bucket.
    Skills {
        /// Task number, `Задание N`, or `none` for unmatched items.
        task: String,
    },

    /// Render a skill's theory as a standalone HTML page.
    Render {
        /// Task number, `Задание N`, or `none`.
        task: String,

        /// Skill title, exactly as listed by `skills`.
        skill: String,

        /// Output file (defaults to stdout).
        #[arg(short, long)]
        out: Option<PathBuf>,
    },

    /// Export a skill's theory as plain text.
    Export {
        /// Task number, `Задание N`, or `none`.
        task: String,

        /// Skill title, exactly as listed by `skills`.
        skill: String,

        /// Output directory (overrides `export.output_dir`).
        #[arg(short, long)]
        out_dir: Option<PathBuf>,
    },

    /// Configuration management.
    Config {
        /// Config subcommand.
        #[command(subcommand)]
        action: ConfigAction,
    },
}

/// Config subcommands.
#[derive(Subcommand)]
pub(crate) enum ConfigAction {
    /// Initialize config file with defaults.
    Init,
    /// Show resolved configuration.
    Show,
}

// ---------------------------------------------------------------------------
// Tracing setup
// ---------------------------------------------------------------------------

/// Initialize tracing based on CLI flags. Logs go to stderr so rendered
/// output on stdout stays clean.
pub(crate) fn init_tracing(cli: &Cli) {
    use tracing_subscriber::{EnvFilter, fmt};

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_filter(cli.verbose)));

    match cli.log_format {
        LogFormat::Text => {
            fmt()
                .with_env_filter(env_filter)
                .with_writer(std::io::stderr)
                .with_target(false)
                .init();
        }
        LogFormat::Json => {
            fmt()
                .json()
                .with_env_filter(env_filter)
                .with_writer(std::io::stderr)
                .init();
        }
    }
}

/// Filter directives for every workspace crate at the verbosity's level.
fn default_filter(verbose: u8) -> String {
    let level = match verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    ["ogetheory", "ogetheory_shared", "ogetheory_core", "ogetheory_markup"]
        .map(|target| format!("{target}={level}"))
        .join(",")
}

// ---------------------------------------------------------------------------
// Command dispatch
// ---------------------------------------------------------------------------

/// Run the CLI command.
pub(crate) fn run(cli: Cli) -> Result<()> {
    let config = resolve_config(&cli)?;

    match cli.command {
        Command::Tasks => cmd_tasks(&config),
        Command::Skills { task } => cmd_skills(&config, &task),
        Command::Render { task, skill, out } => cmd_render(&config, &task, &skill, out),
        Command::Export {
            task,
            skill,
            out_dir,
        } => cmd_export(&config, &task, &skill, out_dir),
        Command::Config { action } => match action {
            ConfigAction::Init => cmd_config_init(),
            ConfigAction::Show => cmd_config_show(&config),
        },
    }
}

/// Config file values overridden by CLI flags.
fn resolve_config(cli: &Cli) -> Result<AppConfig> {
    let mut config = load_config()?;

    if let Some(path) = &cli.theory {
        config.data.theory_path = path.to_string_lossy().into_owned();
    }
    if let Some(path) = &cli.taxonomy {
        config.data.taxonomy_path = path.to_string_lossy().into_owned();
    }
    if let Some(threshold) = cli.threshold {
        config.matching.threshold = threshold;
    }
    config.matching.validate()?;

    Ok(config)
}

fn open_catalog(config: &AppConfig) -> Result<std::sync::Arc<Catalog>> {
    let catalog = Catalog::load(
        &PathBuf::from(&config.data.theory_path),
        &PathBuf::from(&config.data.taxonomy_path),
        config.matching.threshold,
    )?;
    Ok(catalog)
}

/// Find the item for a (task, skill) selection.
///
/// `Ok(None)` means the item exists but has no content; the warning has
/// already been shown.
fn select_item<'a>(
    catalog: &'a Catalog,
    task: &str,
    skill: &str,
) -> Result<Option<(BucketKey, &'a ContentItem, &'a str)>> {
    let key: BucketKey = task.parse()?;

    let item = catalog
        .find(key, skill)
        .ok_or_else(|| eyre!("no skill '{skill}' in {}", key.label()))?;

    let Some(body) = item.body() else {
        warn!(task = %key, skill, "selected item has no content");
        eprintln!("{NO_CONTENT_WARNING}");
        return Ok(None);
    };

    if let Some(matched) = item.matched_skill.as_deref().filter(|m| *m != item.goal_title) {
        eprintln!("Сопоставлен с навыком: «{matched}»");
    }

    Ok(Some((key, item, body)))
}

// ---------------------------------------------------------------------------
// Command handlers
// ---------------------------------------------------------------------------

fn cmd_tasks(config: &AppConfig) -> Result<()> {
    let catalog = open_catalog(config)?;

    for (key, items) in catalog.grouping().iter() {
        println!("{:<16} {}", key.label(), items.len());
    }
    Ok(())
}

fn cmd_skills(config: &AppConfig, task: &str) -> Result<()> {
    let catalog = open_catalog(config)?;
    let key: BucketKey = task.parse()?;

    let items = catalog.items(key);
    if items.is_empty() {
        println!("—");
        return Ok(());
    }
    for item in items {
        println!("{}", item.goal_title);
    }
    Ok(())
}

fn cmd_render(config: &AppConfig, task: &str, skill: &str, out: Option<PathBuf>) -> Result<()> {
    let catalog = open_catalog(config)?;
    let Some((key, item, body)) = select_item(&catalog, task, skill)? else {
        return Ok(());
    };

    let doc = make_full_html(body, &item.goal_title);

    match out {
        Some(path) => {
            std::fs::write(&path, &doc)
                .map_err(|e| eyre!("failed to write {}: {e}", path.display()))?;
            info!(task = %key, path = %path.display(), "rendered HTML written");
            println!("{}", path.display());
        }
        None => print!("{doc}"),
    }
    Ok(())
}

fn cmd_export(
    config: &AppConfig,
    task: &str,
    skill: &str,
    out_dir: Option<PathBuf>,
) -> Result<()> {
    let catalog = open_catalog(config)?;
    let Some((key, item, body)) = select_item(&catalog, task, skill)? else {
        return Ok(());
    };

    let export = text::export(body, &item.goal_title);
    let dir = out_dir.unwrap_or_else(|| PathBuf::from(&config.export.output_dir));
    let path = write_export(&dir, &export_filename(key, &item.goal_title), &export)?;

    info!(task = %key, path = %path.display(), "text export written");
    println!("{}", path.display());
    Ok(())
}

fn cmd_config_init() -> Result<()> {
    let path = init_config()?;
    println!("Config initialized at: {}", path.display());
    Ok(())
}

fn cmd_config_show(config: &AppConfig) -> Result<()> {
    let toml_str = toml::to_string_pretty(config)?;
    println!("{toml_str}");
    Ok(())
}
