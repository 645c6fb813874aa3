use anyhow::{Context, anyhow};
use clap::{Parser, Subcommand};
use csspath_engine::cli::{self, OutputHandlers};
use csspath_engine::{ConfigLoader, CsspathConfig, Document, OutputFormat, Session};
use std::path::PathBuf;
use tracing::debug;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "csspath", version, about = "Compile CSS selectors to XPath and run them")]
struct Args {
    #[command(subcommand)]
    mode: Mode,

    /// Configuration file (defaults to ./csspath.yaml, then ~/.csspath/config.yaml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Compile every selector afresh instead of using the selector cache
    #[arg(long, global = true)]
    no_cache: bool,

    /// Output format: text, json or xpath
    #[arg(long, global = true)]
    format: Option<OutputFormat>,

    /// XML/XHTML document to query
    #[arg(long, global = true)]
    doc: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Mode {
    /// Print the XPath for each selector
    Xpath {
        #[arg(required = true)]
        selectors: Vec<String>,
    },
    /// Run selectors against --doc and print the matches
    Query {
        #[arg(required = true)]
        selectors: Vec<String>,
    },
    /// Execute a script of selectors and directives
    Run {
        file: PathBuf,
        /// Report failing lines and continue instead of stopping at the first
        #[arg(long)]
        keep_going: bool,
    },
    /// Interactive session
    Repl,
}

async fn load_config(args: &Args) -> anyhow::Result<CsspathConfig> {
    let mut config = match &args.config {
        Some(path) => ConfigLoader::load_from(path).await?,
        None => ConfigLoader::load_default().await?,
    };
    if args.no_cache {
        config.compiler.cache_enabled = false;
    }
    if let Some(format) = args.format {
        config.output.format = format;
    }
    debug!(?config, "effective configuration");
    Ok(config)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Logs go to stderr so stdout carries only results.
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    let config = load_config(&args).await?;

    let mut session = Session::new(&config);
    if let Some(path) = &args.doc {
        let document = Document::from_file(path)
            .with_context(|| format!("Failed to load document {}", path.display()))?;
        session = session.with_document(document);
    }

    let output = OutputHandlers {
        out: |msg| println!("{}", msg),
        err: |msg| eprintln!("{}", msg),
    };

    match args.mode {
        Mode::Xpath { selectors } => {
            for selector in &selectors {
                println!("{}", session.compiler().xpath_for(selector)?);
            }
        }
        Mode::Query { selectors } => {
            if session.document().is_none() {
                return Err(anyhow!("query needs a document; pass --doc <file>"));
            }
            for selector in &selectors {
                println!("{}", session.execute_line(selector)?);
            }
        }
        Mode::Run { file, keep_going } => {
            let report = cli::run_script(&mut session, output, &file, !keep_going)
                .await
                .with_context(|| format!("Failed to read script {}", file.display()))?;
            if !report.is_success() {
                return Err(anyhow!(
                    "{} of {} lines in {} failed",
                    report.failures.len(),
                    report.executed,
                    file.display()
                ));
            }
        }
        Mode::Repl => {
            let banner = [
                "Enter a selector to compile it, or run it against the loaded document.",
                "Directives: !load <file>, !cache on|off|clear|status, !format text|json|xpath, !prefix <prefix>",
                "Type 'exit' or 'quit' to close.",
            ];
            cli::run_repl(&mut session, output, &banner)
                .await
                .context("Error during session")?;
        }
    }

    Ok(())
}
