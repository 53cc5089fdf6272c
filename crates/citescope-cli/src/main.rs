use std::path::PathBuf;
use std::time::Instant;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use citescope_core::{AppConfig, LedgerWriter, TitleMatch, read_known_titles, scan_papers};
use citescope_science::{
    CitationPipeline, PipelineOptions, ScholarConfig, SemanticScholarSource, pending,
};

// ─── CLI Definition ─────────────────────────────────────────────────────────

#[derive(Parser)]
#[command(
    name = "citescope",
    about = "Per-year citation counts for a local paper corpus",
    version,
    long_about = None
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Config file (default: ~/.config/citescope/config.toml, or CITESCOPE_CONFIG).
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Output in JSON format.
    /// Also enabled by setting CITESCOPE_JSON=1.
    #[arg(long, global = true)]
    json: bool,

    /// Debug logging (RUST_LOG takes precedence).
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(clap::Args, Clone, Default)]
struct CorpusArgs {
    /// Root of the `<venue+year>/<title>.pdf` tree.
    #[arg(long)]
    papers_root: Option<PathBuf>,

    /// CSV ledger to append to.
    #[arg(long)]
    ledger: Option<PathBuf>,

    /// Skip only titles recorded verbatim instead of any recorded title containing them.
    #[arg(long)]
    exact_titles: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Fetch citations for every paper not yet in the ledger and append them.
    Run {
        #[command(flatten)]
        corpus: CorpusArgs,
    },

    /// List papers that are not yet in the ledger (no network access).
    Pending {
        #[command(flatten)]
        corpus: CorpusArgs,
    },

    /// Config management.
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Print the effective configuration.
    Show,
    /// Write the default configuration to the config path.
    Init {
        #[arg(long)]
        force: bool,
    },
    /// Print the config file path.
    Path,
}

// ─── Main ───────────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> Result<()> {
    let start = Instant::now();
    let cli = Cli::parse();

    // A missing .env is fine; the key may come from the real environment.
    let _ = dotenvy::dotenv();
    init_tracing(cli.verbose);

    let json_output = cli.json || std::env::var("CITESCOPE_JSON").as_deref() == Ok("1");
    let config_path = cli.config.clone().unwrap_or_else(AppConfig::config_path);
    let mut config = AppConfig::load_from(&config_path)
        .with_context(|| format!("loading config from {}", config_path.display()))?;

    match cli.command {
        Commands::Run { corpus } => {
            corpus.apply(&mut config);
            let api_key = std::env::var(&config.scholar.api_key_env).ok();
            if api_key.is_none() {
                warn!(env = %config.scholar.api_key_env, "API key variable not set");
            }

            let window = config.year_window();
            let papers = scan_papers(&config.papers_root(), &config.paths.extension)
                .context("scanning paper corpus")?;
            let known = read_known_titles(&config.ledger_path(), config.run.title_match)
                .context("reading ledger")?;
            let mut ledger = LedgerWriter::open(&config.ledger_path(), &window)
                .context("opening ledger")?;
            info!(
                papers = papers.len(),
                known = known.len(),
                ledger = %ledger.path().display(),
                "starting run"
            );

            let source =
                SemanticScholarSource::new(ScholarConfig::from_app(&config, api_key), window)?;
            let pipeline = CitationPipeline::new(source, PipelineOptions::from_app(&config));
            let report = pipeline.run(&papers, &known, &mut ledger).await?;
            let dur = start.elapsed().as_millis();

            if json_output {
                print_json(&serde_json::json!({
                    "status": "ok",
                    "data": report,
                    "meta": { "duration_ms": dur }
                }))?;
            } else {
                println!("Run finished:");
                println!("  Scanned:       {}", report.scanned);
                println!("  Skipped:       {}", report.skipped);
                println!("  Appended:      {}", report.appended);
                println!("  Unresolved:    {}", report.unresolved);
                println!("  Fetch failed:  {}", report.fetch_failed);
                if report.citations_outside_window > 0 {
                    println!(
                        "  Not recorded:  {} citation(s) outside {}-{}",
                        report.citations_outside_window,
                        config.run.newest_year - config.run.year_count as i32 + 1,
                        config.run.newest_year
                    );
                }
            }
        }

        Commands::Pending { corpus } => {
            corpus.apply(&mut config);
            let papers = scan_papers(&config.papers_root(), &config.paths.extension)
                .context("scanning paper corpus")?;
            let known = read_known_titles(&config.ledger_path(), config.run.title_match)
                .context("reading ledger")?;
            let todo = pending(&papers, &known);
            let dur = start.elapsed().as_millis();

            if json_output {
                print_json(&serde_json::json!({
                    "status": "ok",
                    "data": { "items": todo, "total": todo.len(), "scanned": papers.len() },
                    "meta": { "duration_ms": dur }
                }))?;
            } else if todo.is_empty() {
                println!("Nothing pending: all {} paper(s) are in the ledger.", papers.len());
            } else {
                for paper in &todo {
                    println!(
                        "{venue:<10} {year}  {title}",
                        venue = paper.venue,
                        year = paper.year,
                        title = paper.title
                    );
                }
                println!("{} of {} paper(s) pending.", todo.len(), papers.len());
            }
        }

        Commands::Config { action } => match action {
            ConfigAction::Show => {
                if json_output {
                    print_json(&serde_json::json!({"status": "ok", "data": config}))?;
                } else {
                    print!("{}", toml::to_string_pretty(&config)?);
                }
            }
            ConfigAction::Init { force } => {
                if config_path.exists() && !force {
                    eprintln!(
                        "Config already exists at {}. Use --force to overwrite.",
                        config_path.display()
                    );
                    std::process::exit(1);
                }
                AppConfig::default().save_to(&config_path)?;
                println!("Wrote default config to {}", config_path.display());
            }
            ConfigAction::Path => println!("{}", config_path.display()),
        },
    }

    Ok(())
}

impl CorpusArgs {
    fn apply(&self, config: &mut AppConfig) {
        if let Some(root) = &self.papers_root {
            config.paths.papers_root = root.to_string_lossy().into_owned();
        }
        if let Some(ledger) = &self.ledger {
            config.paths.ledger = ledger.to_string_lossy().into_owned();
        }
        if self.exact_titles {
            config.run.title_match = TitleMatch::Exact;
        }
    }
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stdout)
        .with_target(false)
        .try_init();
}

fn print_json(value: &serde_json::Value) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
