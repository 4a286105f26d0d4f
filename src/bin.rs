//! `postmaster-bot` executable.
//!
//! Parses the command line, installs tracing, loads configuration, and hands
//! over to [`postmaster_bot::start`] until the bot is stopped with Ctrl-C.

use std::path::PathBuf;

use clap::{ArgAction, Parser};
use opentelemetry::trace::TracerProvider;
use opentelemetry_otlp::{Protocol, WithExportConfig};
use postmaster_bot::base::{config::Config, types::Void};
use tracing::Level;
use tracing_subscriber::{filter::LevelFilter, fmt::format::FmtSpan, layer::SubscriberExt, util::SubscriberInitExt};

/// Postmaster: jot down your day in Telegram, get social media drafts back.
///
/// Settings are read from `POSTMASTER_*` environment variables and, when present,
/// from a TOML file (`.hidden/config.toml` unless `--config` is given).
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// TOML config file to read instead of `.hidden/config.toml`.
    #[arg(short, long)]
    config: Option<PathBuf>,
    /// Log more: `-v` for debug, `-vv` for trace.
    #[arg(short, long, action = ArgAction::Count)]
    verbose: u8,
    /// Also export spans over OTLP/HTTP (see `OTEL_EXPORTER_OTLP_*`).
    #[arg(long)]
    otel: bool,
}

#[tokio::main]
async fn main() -> Void {
    let args = Args::parse();

    init_tracing(args.verbose, args.otel)?;

    let config = Config::load(args.config.as_deref())?;

    postmaster_bot::start(config).await
}

/// Installs the stdout log layer and, if asked, the OTLP span exporter.
fn init_tracing(verbose: u8, otel: bool) -> Void {
    let level = match verbose {
        0 => Level::INFO,
        1 => Level::DEBUG,
        _ => Level::TRACE,
    };

    let stdout = tracing_subscriber::fmt::layer()
        .without_time()
        .with_target(false)
        .with_span_events(FmtSpan::CLOSE);

    let otel = if otel {
        let exporter = opentelemetry_otlp::SpanExporter::builder().with_http().with_protocol(Protocol::HttpBinary).build()?;
        let provider = opentelemetry_sdk::trace::SdkTracerProvider::builder().with_simple_exporter(exporter).build();

        Some(tracing_opentelemetry::layer().with_tracer(provider.tracer("postmaster-bot")))
    } else {
        None
    };

    tracing_subscriber::registry()
        .with(otel)
        .with(LevelFilter::from_level(level))
        .with(stdout)
        .init();

    Ok(())
}
