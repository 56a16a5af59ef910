use anyhow::{bail, Context, Result};
use chrono::{Local, NaiveDate};
use clap::{Parser, Subcommand};
use std::io::Read;
use std::path::PathBuf;
use tokio::sync::broadcast::error::RecvError;
use tracing::{info, warn, Level};
use tracing_subscriber::{fmt, EnvFilter};

use resoconto::markdown::{convert_html, markdown_to_html, normalize_rich_text};
use resoconto::{
    GenerationRequest, HttpClient, Period, ReportApi, ReportDraft, ReportPoller, ReportStatus,
    ReportStore, Settings, Template,
};

#[derive(Parser, Debug)]
#[command(name = "resoconto")]
#[command(about = "Generate, review and confirm work-journal reports")]
#[command(version)]
struct Args {
    #[command(subcommand)]
    command: Commands,

    /// Backend base URL (overrides RESOCONTO_API_BASE)
    #[arg(long, global = true)]
    api_base: Option<String>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "info", global = true)]
    log_level: String,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Generate a report and wait until it is ready
    Generate {
        /// week, month or year
        #[arg(long)]
        period: Period,

        /// formal or simple
        #[arg(long, default_value = "formal")]
        template: Template,

        /// Any day inside the wanted period (YYYY-MM-DD)
        /// Default: today
        #[arg(long, conflicts_with_all = ["from", "to"])]
        anchor: Option<NaiveDate>,

        /// Explicit range start (YYYY-MM-DD)
        #[arg(long, requires = "to")]
        from: Option<NaiveDate>,

        /// Explicit range end (YYYY-MM-DD)
        #[arg(long, requires = "from")]
        to: Option<NaiveDate>,
    },

    /// Confirm a ready report, optionally saving new content first
    Confirm {
        id: String,

        /// File with the edited content (markdown or editor HTML)
        #[arg(long)]
        content_file: Option<PathBuf>,
    },

    /// Print one report
    Show { id: String },

    /// List reports of a period
    List {
        #[arg(long)]
        period: Period,
    },

    /// Convert markdown to editor HTML (stdin when no file is given)
    ToHtml { file: Option<PathBuf> },

    /// Convert editor HTML to markdown (stdin when no file is given)
    ToMarkdown { file: Option<PathBuf> },
}

fn init_tracing(log_level: &str) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(log_level))
        .add_directive("hyper=warn".parse().expect("static directive"))
        .add_directive("reqwest=warn".parse().expect("static directive"));

    // stdout carries command output
    fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_max_level(Level::TRACE)
        .with_writer(std::io::stderr)
        .init();
}

fn read_input(file: Option<PathBuf>) -> Result<String> {
    match file {
        Some(path) => std::fs::read_to_string(&path)
            .with_context(|| format!("Failed to read {}", path.display())),
        None => {
            let mut input = String::new();
            std::io::stdin()
                .read_to_string(&mut input)
                .context("Failed to read stdin")?;
            Ok(input)
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    init_tracing(&args.log_level);

    let mut settings = Settings::from_env();
    if let Some(api_base) = args.api_base {
        settings.api_base = api_base;
    }

    match args.command {
        Commands::Generate {
            period,
            template,
            anchor,
            from,
            to,
        } => generate_command(&settings, period, template, anchor, from.zip(to)).await?,
        Commands::Confirm { id, content_file } => {
            confirm_command(&settings, &id, content_file).await?
        }
        Commands::Show { id } => {
            let client = HttpClient::new(&settings.api_base);
            let report = client.get_report(&id).await?;
            println!("{} [{}]", report.title, report.status);
            if report.status == ReportStatus::Failed {
                println!("{}", report.failure_reason());
            } else {
                println!("{}", report.content);
            }
        }
        Commands::List { period } => {
            let client = HttpClient::new(&settings.api_base);
            let store = ReportStore::new();
            store.replace_all(client.list_reports(period).await?).await;
            info!(count = store.len().await, period = %period, "Fetched reports");
            for report in store.list().await {
                let mark = if report.confirmed { "confirmed" } else { "" };
                println!(
                    "{}\t{}..{}\t{}\t{}\t{}",
                    report.id, report.start_date, report.end_date, report.status, report.title, mark
                );
            }
        }
        Commands::ToHtml { file } => {
            println!("{}", markdown_to_html(&read_input(file)?));
        }
        Commands::ToMarkdown { file } => {
            let converted = convert_html(&read_input(file)?);
            if converted.degraded {
                warn!("Input was not well-formed, formatting was dropped");
            }
            println!("{}", converted.markdown);
        }
    }

    Ok(())
}

async fn generate_command(
    settings: &Settings,
    period: Period,
    template: Template,
    anchor: Option<NaiveDate>,
    range: Option<(NaiveDate, NaiveDate)>,
) -> Result<()> {
    let today = Local::now().date_naive();
    let request = match range {
        Some((start, end)) => GenerationRequest::new(period, start, end, template),
        None => GenerationRequest::for_period(period, anchor.unwrap_or(today), template),
    };
    request.validate(today)?;

    info!(
        period = %request.period,
        start = %request.start_date,
        end = %request.end_date,
        template = %request.template,
        "Generating report"
    );

    let store = ReportStore::new();
    let poller = ReportPoller::new(HttpClient::new(&settings.api_base), settings.poll, store.clone());

    let mut snapshots = store.subscribe();
    let watcher = tokio::spawn(async move {
        loop {
            match snapshots.recv().await {
                Ok(report) => info!(id = %report.id, status = %report.status, "Report status"),
                Err(RecvError::Lagged(_)) => continue,
                Err(RecvError::Closed) => break,
            }
        }
    });

    let result = tokio::select! {
        result = poller.generate(&request) => result,
        _ = tokio::signal::ctrl_c() => {
            watcher.abort();
            warn!("Interrupted, no longer waiting for the report");
            return Ok(());
        }
    };
    watcher.abort();

    let report = result?;
    println!("{}", report.content);
    Ok(())
}

async fn confirm_command(settings: &Settings, id: &str, content_file: Option<PathBuf>) -> Result<()> {
    let store = ReportStore::new();
    let poller = ReportPoller::new(HttpClient::new(&settings.api_base), settings.poll, store.clone());

    let current = poller.api().get_report(id).await?;
    if current.status != ReportStatus::Ready {
        bail!("Report {id} is {}, only ready reports can be confirmed", current.status);
    }
    store.merge(current.clone()).await;

    let mut draft = ReportDraft::new(store.clone(), id);
    draft.load(&current.content);
    if let Some(path) = content_file {
        let edited = read_input(Some(path))?;
        draft.on_surface_update(&normalize_rich_text(&edited)).await;
    }

    let report = poller.confirm(id, draft.markdown()).await?;
    info!(id = %report.id, confirmed = report.confirmed, "Done");
    Ok(())
}
