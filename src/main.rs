//! HSA filter binary entrypoint.
//! Batch finalize/cleanup over an issue tree, one-off classification, and the
//! Axum HTTP service.

use std::fs;
use std::net::SocketAddr;
use std::path::PathBuf;

use anyhow::{bail, Context};
use clap::{Parser, Subcommand};
use tracing::{info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use hsa_filter::api::{create_router, AppState};
use hsa_filter::batch::{self, cleanup, IssueDate, OutputLayout, RunReport};
use hsa_filter::classify::config::DEFAULT_CLASSIFIER_CONFIG_PATH;
use hsa_filter::classify::{start_hot_reload_thread, Classifier, ClassifierConfig, ClassifierHandle};
use hsa_filter::metrics::Metrics;

const ENV_LOG_JSON: &str = "HSA_FILTER_LOG_JSON";

#[derive(Parser)]
#[command(name = "hsa-filter")]
#[command(about = "Separate news articles from ads and sanitize OCR bodies")]
struct Cli {
    /// Classifier config (TOML). Defaults to $HSA_FILTER_CONFIG, then config/classifier.toml.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Classify classified/ issues into hsa-ready/ and rejected/
    Finalize {
        /// Output root containing classified/
        #[arg(long, default_value = "output")]
        output: PathBuf,

        /// Only this issue (YYYY-MM-DD); otherwise every issue found
        #[arg(long)]
        issue: Option<String>,

        /// Write the run report as JSON here
        #[arg(long)]
        report: Option<PathBuf>,

        /// Also reject articles with an unknown section
        #[arg(long)]
        strict: bool,
    },

    /// Re-check hsa-ready/ strictly and move rejects to rejected/cleaned/
    Cleanup {
        #[arg(long, default_value = "output")]
        output: PathBuf,

        /// Report what would move without touching files
        #[arg(long)]
        dry_run: bool,
    },

    /// Print the classification of one JSON record
    Classify { file: PathBuf },

    /// Run the HTTP API
    Serve {
        #[arg(long, default_value = "127.0.0.1:8080")]
        addr: SocketAddr,
    },
}

/// Structured logs to stderr. RUST_LOG wins over the built-in filter;
/// HSA_FILTER_LOG_JSON=1 switches to JSON lines.
fn init_tracing() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("hsa_filter=info,warn"));

    let json = std::env::var(ENV_LOG_JSON).ok().is_some_and(|v| v == "1");

    let registry = tracing_subscriber::registry().with(filter);
    if json {
        registry
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        registry
            .with(fmt::layer().compact().with_writer(std::io::stderr))
            .init();
    }
}

fn load_config(explicit: Option<&PathBuf>) -> anyhow::Result<ClassifierConfig> {
    ClassifierConfig::load(explicit.map(PathBuf::as_path)).with_context(|| match explicit {
        Some(path) => format!("loading classifier config {}", path.display()),
        None => "loading classifier config".to_string(),
    })
}

fn config_watch_path(explicit: Option<&PathBuf>) -> PathBuf {
    explicit
        .cloned()
        .or_else(ClassifierConfig::resolved_path)
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CLASSIFIER_CONFIG_PATH))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env in local/dev; missing file is fine.
    let _ = dotenvy::dotenv();
    init_tracing();

    let cli = Cli::parse();
    let cfg = load_config(cli.config.as_ref())?;

    match cli.command {
        Command::Finalize {
            output,
            issue,
            report,
            strict,
        } => {
            let mut classifier = Classifier::new(cfg)?;
            if strict {
                classifier = classifier.with_strict_sections();
            }
            let layout = OutputLayout::new(output);

            let run = match issue {
                Some(raw) => {
                    let issue = IssueDate::parse(&raw)?;
                    let r = batch::finalize_issue(&classifier, &layout, issue)?;
                    let mut run = RunReport::new();
                    run.add_issue(issue.to_string(), r);
                    run
                }
                None => batch::process_all_issues(&classifier, &layout)?,
            };

            print!("{}", run.render_text());
            if let Some(path) = report {
                run.save_json(&path)?;
                info!(path = %path.display(), "report saved");
            }
        }

        Command::Cleanup { output, dry_run } => {
            let classifier = Classifier::new(cfg)?;
            let layout = OutputLayout::new(output);
            let report = cleanup::cleanup_accepted(&classifier, &layout, dry_run)?;
            let title = if dry_run {
                "HSA CLEANUP (dry run)"
            } else {
                "HSA CLEANUP"
            };
            print!("{}", report.render_text(title));
        }

        Command::Classify { file } => {
            let content = fs::read_to_string(&file)
                .with_context(|| format!("reading {}", file.display()))?;
            let record: serde_json::Value = serde_json::from_str(&content)?;
            if !record.is_object() {
                bail!("{} does not contain a JSON object", file.display());
            }
            let classifier = Classifier::new(cfg)?;
            let verdict = classifier.classify_value(&record);
            println!("{}", serde_json::to_string_pretty(&verdict)?);
        }

        Command::Serve { addr } => {
            let metrics = match Metrics::init(&cfg) {
                Ok(m) => Some(m),
                Err(e) => {
                    warn!(error = %e, "metrics disabled");
                    None
                }
            };

            let handle = ClassifierHandle::new(Classifier::new(cfg)?);
            start_hot_reload_thread(handle.clone(), config_watch_path(cli.config.as_ref()));

            let mut app = create_router(AppState { classifier: handle });
            if let Some(m) = &metrics {
                app = app.merge(m.router());
            }

            let listener = tokio::net::TcpListener::bind(addr)
                .await
                .with_context(|| format!("binding {addr}"))?;
            info!(%addr, "listening");
            axum::serve(listener, app).await?;
        }
    }

    Ok(())
}
