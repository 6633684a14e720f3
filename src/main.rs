mod bibtex_io;
mod compare;
mod config;
mod entry;
mod error;
mod http;
mod identifiers;
mod lint;
mod logger;
mod merge;
mod normalize;
mod orchestrator;
mod pipeline;
mod protocol;
mod rate_limit;
mod report;
mod session;
mod source;
mod store;

use std::{
    io::{self, IsTerminal},
    path::PathBuf,
    time::Duration,
};

use anyhow::{Context, Result};
use clap::Parser;
use clap_verbosity_flag::{Verbosity, WarnLevel};

use http::HttpClient;
use logger::Logger;
use orchestrator::Limiters;
use session::Session;
use store::Store;

static LOGGER: Logger = Logger {};

/// Determine the default value for `interactive` based on interactivity of
/// stdin and stderr.
fn determine_interactive() -> bool {
    io::stdin().is_terminal() && io::stderr().is_terminal()
}

/// Cross-checks bibliographic references against external registries and
/// merges the results.
#[derive(Debug, Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// BibTeX file to validate.
    input: PathBuf,

    /// Write the updated bibliography here instead of overwriting the input.
    #[arg(short, long, value_name = "PATH")]
    output: Option<PathBuf>,

    /// Use configuration file.
    #[arg(short, long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Override the configured worker-pool parallelism.
    #[arg(long, value_name = "N")]
    parallelism: Option<usize>,

    /// Leave every entry's review pending for an external front-end instead
    /// of auto-applying every proposed value.
    #[arg(short, long, default_value_t = determine_interactive())]
    interactive: bool,

    #[command(flatten)]
    verbose: Verbosity<WarnLevel>,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    log::set_logger(&LOGGER)
        .map(|()| log::set_max_level(cli.verbose.log_level_filter()))
        .expect("logger is only ever installed once");

    let config = match &cli.config {
        Some(path) => config::load(path, false).context("failed to load configuration")?,
        None => config::load("refval.toml", true).context("failed to load configuration")?,
    };
    let parallelism = cli.parallelism.unwrap_or(config.parallelism);

    let mut store = Store::load(&cli.input)
        .with_context(|| format!("failed to load bibliography at '{}'", cli.input.display()))?;

    let client = HttpClient::new(&config.contact_email, Duration::from_secs(config.request_timeout_secs))
        .context("failed to build HTTP client")?;
    let limiters = Limiters::new(
        client,
        Duration::from_secs_f64(config.source_delay_secs),
        Duration::from_secs_f64(config.arxiv_delay_secs),
    );

    let entries: Vec<_> = store.iter().cloned().collect();

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("failed to start async runtime")?;
    let results = runtime.block_on(pipeline::run(&entries, &limiters, parallelism));

    print!("{}", report::render(&results));

    let mut session = Session::new();
    for result in results {
        session.insert(result);
    }

    if !cli.interactive {
        // Outside interactive mode, auto-apply accept_all_global rather than
        // waiting for a front-end to drive per-field decisions.
        for (key, err) in session.accept_all_global(&mut store) {
            logger::error!("failed to commit '{key}': {err}");
        }

        let output_path = cli.output.as_ref().unwrap_or(&cli.input);
        if output_path == &cli.input {
            store.flush().context("failed to write updated bibliography")?;
        } else {
            let text = bibtex_io::serialize_all(store.iter());
            std::fs::write(output_path, text)
                .with_context(|| format!("failed to write '{}'", output_path.display()))?;
        }
    }

    if Logger::has_error() {
        std::process::exit(1);
    }
    Ok(())
}
