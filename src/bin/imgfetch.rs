use std::io::{self, BufRead, Write};
use std::process::ExitCode;
use std::time::Duration;

use camino::Utf8PathBuf;
use clap::Parser;
use miette::IntoDiagnostic;
use tracing_subscriber::EnvFilter;

use imgfetch::config::{ConfigLoader, DEFAULT_DIRECTORY};
use imgfetch::error::FetchError;
use imgfetch::fetcher::{ImageFetcher, ProgressEvent, ProgressSink, Summary, summarize};
use imgfetch::http::HttpImageSource;
use imgfetch::output::{JsonOutput, OutputMode};

#[derive(Parser)]
#[command(name = "imgfetch")]
#[command(about = "Download images politely: type checks, size caps, duplicate detection")]
#[command(version, author)]
struct Cli {
    /// Image URLs to fetch; prompts interactively when omitted
    urls: Vec<String>,

    /// Output directory for saved images
    #[arg(long)]
    dir: Option<String>,

    /// Path to a JSON config listing URLs (default: imgfetch.json)
    #[arg(long)]
    config: Option<String>,

    /// Pause between requests in a batch, in milliseconds
    #[arg(long)]
    delay_ms: Option<u64>,

    /// Print machine-readable JSON instead of status lines
    #[arg(long)]
    non_interactive: bool,
}

fn main() -> ExitCode {
    if let Err(report) = run() {
        eprintln!("{report:?}");
        if let Some(err) = report.downcast_ref::<FetchError>() {
            return ExitCode::from(map_exit_code(err));
        }
        return ExitCode::from(1);
    }
    ExitCode::SUCCESS
}

fn map_exit_code(error: &FetchError) -> u8 {
    match error {
        FetchError::MissingConfig | FetchError::ConfigRead(_) | FetchError::ConfigParse(_) => 2,
        err if err.is_network() => 3,
        _ => 1,
    }
}

fn run() -> miette::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let output_mode = if cli.non_interactive {
        OutputMode::NonInteractive
    } else {
        OutputMode::Interactive
    };

    let config = if cli.urls.is_empty() {
        match ConfigLoader::resolve(cli.config.as_deref()) {
            Ok(resolved) => Some(resolved),
            Err(FetchError::MissingConfig) if cli.config.is_none() => None,
            Err(err) => return Err(err).into_diagnostic(),
        }
    } else {
        None
    };

    let directory = cli
        .dir
        .map(Utf8PathBuf::from)
        .or_else(|| config.as_ref().map(|resolved| resolved.directory.clone()))
        .unwrap_or_else(|| Utf8PathBuf::from(DEFAULT_DIRECTORY));

    let urls = if !cli.urls.is_empty() {
        cli.urls
    } else if let Some(resolved) = config {
        resolved.urls
    } else if matches!(output_mode, OutputMode::Interactive) {
        prompt_for_urls().into_diagnostic()?
    } else {
        return Err(miette::Report::msg(
            "no URLs given (pass URLs, --config, or run interactively)",
        ));
    };

    if urls.is_empty() {
        println!("nothing to fetch");
        return Ok(());
    }

    let source = HttpImageSource::new().into_diagnostic()?;
    let mut fetcher = ImageFetcher::new(directory, source);
    if let Some(ms) = cli.delay_ms {
        fetcher = fetcher.with_delay(Duration::from_millis(ms));
    }

    match output_mode {
        OutputMode::NonInteractive => {
            let reports = fetcher.fetch_many(&urls, &JsonOutput);
            let summary = summarize(&reports, fetcher.directory());
            JsonOutput::print_batch(&reports, &summary).into_diagnostic()?;
        }
        OutputMode::Interactive => {
            let reports = fetcher.fetch_many(&urls, &ConsoleSink);
            let summary = summarize(&reports, fetcher.directory());
            print_summary(&summary);
        }
    }
    Ok(())
}

struct ConsoleSink;

impl ProgressSink for ConsoleSink {
    fn event(&self, event: ProgressEvent) {
        println!("{}", event.message);
    }
}

fn print_summary(summary: &Summary) {
    let green = "\x1b[32m";
    let red = "\x1b[31m";
    let cyan = "\x1b[36m";
    let reset = "\x1b[0m";

    println!("{cyan}imgfetch summary{reset}");
    println!("{green}successful downloads: {}{reset}", summary.succeeded);
    println!("{red}failed attempts: {}{reset}", summary.failed);
    println!("images stored in: {}", summary.directory);
}

fn prompt_for_urls() -> io::Result<Vec<String>> {
    println!("Choose your approach:");
    println!("1. Fetch a single image");
    println!("2. Fetch multiple images");
    print!("\nEnter your choice (1 or 2): ");
    io::stdout().flush()?;

    let stdin = io::stdin();
    let mut choice = String::new();
    stdin.lock().read_line(&mut choice)?;

    match choice.trim() {
        "1" => {
            print!("Image URL: ");
            io::stdout().flush()?;
            let mut url = String::new();
            stdin.lock().read_line(&mut url)?;
            let url = url.trim().to_string();
            Ok(if url.is_empty() { Vec::new() } else { vec![url] })
        }
        "2" => {
            println!("Enter image URLs (one per line, empty line to finish):");
            let mut urls = Vec::new();
            for line in stdin.lock().lines() {
                let line = line?;
                let url = line.trim().to_string();
                if url.is_empty() {
                    break;
                }
                urls.push(url);
            }
            Ok(urls)
        }
        _ => {
            println!("invalid choice");
            Ok(Vec::new())
        }
    }
}
