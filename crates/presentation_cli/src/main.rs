//! VoiceStream CLI
//!
//! Speaks text aloud while it is still being produced: either a streamed
//! chat completion (`ask`) or a fixed text (`say`).

#![allow(clippy::print_stdout, clippy::print_stderr)]

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use ai_core::OpenAIChatEngine;
use application::{
    CancellationFlag, PipelineError, PipelineMode, PipelineReport, SpeechPipeline, TokenSource,
};
use clap::{Parser, Subcommand};
use domain::ChunkThreshold;
use infrastructure::{
    AppConfig, DecoderAdapter, InferenceTokenSource, SinkKind, SpeechSynthesisAdapter,
    TextTokenSource,
};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// VoiceStream CLI
#[derive(Parser)]
#[command(name = "voicestream")]
#[command(author, version, about = "Speak streamed text as it arrives", long_about = None)]
struct Cli {
    /// Verbosity level
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Pipeline mode: sequential or pipelined
    #[arg(long, global = true)]
    mode: Option<PipelineMode>,

    /// Minimum chunk length in bytes before synthesis starts
    #[arg(long, global = true)]
    threshold: Option<usize>,

    /// Audio output: paced or device
    #[arg(long, global = true)]
    sink: Option<SinkKind>,

    /// Configuration file (defaults to ./config.toml when present)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Ask the chat model and speak the answer while it streams
    Ask {
        /// Prompt to send
        prompt: String,
    },

    /// Speak a fixed text
    Say {
        /// Text to speak
        text: String,
    },
}

/// Determine log filter level from verbosity count
const fn log_filter_from_verbosity(verbose: u8) -> &'static str {
    match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    }
}

/// Apply command-line overrides on top of the loaded configuration
fn apply_overrides(cli: &Cli, config: &mut AppConfig) -> anyhow::Result<()> {
    if let Some(mode) = cli.mode {
        config.pipeline.mode = mode;
    }
    if let Some(threshold) = cli.threshold {
        config.pipeline.chunk_threshold = ChunkThreshold::new(threshold)?;
    }
    if let Some(sink) = cli.sink {
        config.playback.sink = sink;
    }
    Ok(())
}

/// Notice printed before a run whose audio will not be heard
fn dry_run_notice(sink: SinkKind) -> Option<String> {
    if sink.is_audible() {
        return None;
    }
    let hint = if cfg!(feature = "device") {
        "pass --sink device to hear it"
    } else {
        "rebuild with the `device` feature to hear it"
    };
    Some(format!(
        "dry run: audio goes to the {sink} sink and is not played ({hint})"
    ))
}

/// Process exit status for a failed run
const fn exit_status(err: &PipelineError) -> u8 {
    if err.is_cancelled() { 130 } else { 1 }
}

fn summary(report: &PipelineReport) -> String {
    let seconds = report
        .spec
        .map(|spec| {
            usize::try_from(report.frames_played)
                .map_or(0.0, |frames| spec.duration_of(frames).as_secs_f64())
        })
        .unwrap_or_default();
    format!(
        "Spoke {} chunk(s), {seconds:.1}s of audio ({} mode)",
        report.chunks_played, report.mode
    )
}

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    let cli = Cli::parse();

    // Set up logging based on verbosity
    let filter = log_filter_from_verbosity(cli.verbose);

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(filter))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let mut config = AppConfig::load(cli.config.as_deref())?;
    apply_overrides(&cli, &mut config)?;
    config.validate()?;

    if let Some(notice) = dry_run_notice(config.playback.sink) {
        eprintln!("voicestream: {notice}");
    }

    let pipeline = SpeechPipeline::new(
        Arc::new(SpeechSynthesisAdapter::new(config.speech.clone())?),
        Arc::new(DecoderAdapter::new()),
        Arc::new(config.playback.device()),
        config.pipeline.clone(),
    )?;

    let stop = CancellationFlag::new();
    let ctrl_c = stop.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("Interrupt received, stopping");
            ctrl_c.cancel();
        }
    });

    let mut source: Box<dyn TokenSource> = match &cli.command {
        Commands::Ask { prompt } => {
            let engine = Arc::new(OpenAIChatEngine::new(config.inference.clone())?);
            Box::new(InferenceTokenSource::ask(engine, prompt).await?)
        },
        Commands::Say { text } => Box::new(TextTokenSource::new(text)),
    };

    match pipeline.run_until_cancelled(source.as_mut(), &stop).await {
        Ok(report) => {
            println!("{}", summary(&report));
            Ok(ExitCode::SUCCESS)
        },
        Err(err) => {
            warn!(stage = %err.stage(), index = %err.index(), "Run failed");
            eprintln!(
                "voicestream: {} failed at chunk {}: {err}",
                err.stage(),
                err.index()
            );
            Ok(ExitCode::from(exit_status(&err)))
        },
    }
}

#[cfg(test)]
mod tests {
    use application::{ApplicationError, PipelineStage};
    use domain::{AudioSpec, SequenceIndex};

    use super::*;

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(args).unwrap()
    }

    #[test]
    fn log_filter_verbosity_zero() {
        assert_eq!(log_filter_from_verbosity(0), "warn");
    }

    #[test]
    fn log_filter_verbosity_one() {
        assert_eq!(log_filter_from_verbosity(1), "info");
    }

    #[test]
    fn log_filter_verbosity_two() {
        assert_eq!(log_filter_from_verbosity(2), "debug");
    }

    #[test]
    fn log_filter_verbosity_three_or_more() {
        assert_eq!(log_filter_from_verbosity(3), "trace");
        assert_eq!(log_filter_from_verbosity(10), "trace");
    }

    #[test]
    fn parses_ask_with_global_flags() {
        let cli = parse(&[
            "voicestream",
            "ask",
            "What is Rust?",
            "--mode",
            "sequential",
            "--threshold",
            "40",
            "--sink",
            "device",
            "-vv",
        ]);

        assert!(matches!(&cli.command, Commands::Ask { prompt } if prompt == "What is Rust?"));
        assert_eq!(cli.mode, Some(PipelineMode::Sequential));
        assert_eq!(cli.threshold, Some(40));
        assert_eq!(cli.sink, Some(SinkKind::Device));
        assert_eq!(cli.verbose, 2);
    }

    #[test]
    fn parses_say_with_config_path() {
        let cli = parse(&["voicestream", "--config", "/etc/vs.toml", "say", "Hello"]);

        assert!(matches!(&cli.command, Commands::Say { text } if text == "Hello"));
        assert_eq!(cli.config, Some(PathBuf::from("/etc/vs.toml")));
    }

    #[test]
    fn rejects_unknown_mode() {
        assert!(Cli::try_parse_from(["voicestream", "--mode", "turbo", "say", "x"]).is_err());
    }

    #[test]
    fn requires_subcommand() {
        assert!(Cli::try_parse_from(["voicestream"]).is_err());
    }

    #[test]
    fn overrides_replace_config_values() {
        let cli = parse(&[
            "voicestream",
            "say",
            "x",
            "--mode",
            "seq",
            "--threshold",
            "7",
            "--sink",
            "device",
        ]);
        let mut config = AppConfig::default();

        apply_overrides(&cli, &mut config).unwrap();

        assert_eq!(config.pipeline.mode, PipelineMode::Sequential);
        assert_eq!(config.pipeline.chunk_threshold.get(), 7);
        assert_eq!(config.playback.sink, SinkKind::Device);
    }

    #[test]
    fn zero_threshold_override_is_rejected() {
        let cli = parse(&["voicestream", "say", "x", "--threshold", "0"]);
        let mut config = AppConfig::default();

        assert!(apply_overrides(&cli, &mut config).is_err());
    }

    #[test]
    fn no_overrides_keep_config() {
        let cli = parse(&["voicestream", "say", "x"]);
        let mut config = AppConfig::default();

        apply_overrides(&cli, &mut config).unwrap();

        assert_eq!(config.pipeline.mode, PipelineMode::Pipelined);
        assert_eq!(config.playback.sink, SinkKind::default());
    }

    #[test]
    fn paced_sink_is_announced_as_dry_run() {
        let notice = dry_run_notice(SinkKind::Paced).unwrap();
        assert!(notice.starts_with("dry run"));
        assert!(notice.contains("paced"));
    }

    #[test]
    fn device_sink_has_no_dry_run_notice() {
        assert!(dry_run_notice(SinkKind::Device).is_none());
    }

    #[test]
    fn cancelled_run_exits_with_interrupt_code() {
        let err = PipelineError::Cancelled {
            index: SequenceIndex::new(2),
        };
        assert_eq!(exit_status(&err), 130);

        let err = PipelineError::Playback {
            index: SequenceIndex::FIRST,
            source: ApplicationError::Device("gone".to_string()),
        };
        assert_eq!(err.stage(), PipelineStage::Playback);
        assert_eq!(exit_status(&err), 1);
    }

    #[test]
    fn summary_reports_audio_duration() {
        let report = PipelineReport {
            mode: PipelineMode::Pipelined,
            chunks_played: 3,
            blocks_played: 10,
            frames_played: 24_000,
            spec: Some(AudioSpec::new(8000, 1).unwrap()),
        };

        assert_eq!(
            summary(&report),
            "Spoke 3 chunk(s), 3.0s of audio (pipelined mode)"
        );
    }
}
