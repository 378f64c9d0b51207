//! Logging setup.
//!
//! Logs go to stderr so they never interleave with tables on stdout. The
//! filter comes from `RUST_LOG` when set, otherwise from a preset chosen by
//! CLI flags plus any `--log target=level` overrides.

use clap::{Args, ValueEnum};
use tracing_subscriber::{
    EnvFilter,
    filter::LevelFilter,
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
};

const TARGET_ROOT: &str = "basket";

/// Log output format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LogPreset {
    /// Warnings from the core, plus job and startup events.
    #[default]
    Normal,
    Verbose,
    Debug,
    Trace,
    /// Errors only.
    Quiet,
}

impl LogPreset {
    fn directives(self) -> &'static [&'static str] {
        match self {
            LogPreset::Normal => &[
                "basket=warn",
                "basket::startup=info",
                "basket::jobs=info",
                "basket::health=warn",
                "reqwest=warn",
            ],
            LogPreset::Verbose => &["basket=info", "reqwest=warn"],
            LogPreset::Debug => &["basket=debug", "reqwest=info"],
            LogPreset::Trace => &["basket=trace", "reqwest=debug", "hyper=debug"],
            LogPreset::Quiet => &["basket=error", "reqwest=error"],
        }
    }
}

/// Logging flags shared by every subcommand.
#[derive(Debug, Clone, Default, Args)]
pub struct LogArgs {
    /// More operational detail (INFO for all targets)
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// DEBUG logging, including HTTP calls
    #[arg(short, long, global = true)]
    pub debug: bool,

    /// TRACE logging for everything
    #[arg(long, global = true)]
    pub trace: bool,

    /// Errors only
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Per-target level, e.g. "jobs=debug" or "health=trace,query=debug".
    /// Targets without a "basket::" prefix get one.
    #[arg(long = "log", value_name = "TARGET=LEVEL", global = true)]
    pub overrides: Vec<String>,

    /// Log output format
    #[arg(long = "log-format", value_enum, default_value_t = LogFormat::Text, global = true)]
    pub format: LogFormat,
}

impl LogArgs {
    /// Quiet beats trace beats debug beats verbose.
    pub fn preset(&self) -> LogPreset {
        if self.quiet {
            LogPreset::Quiet
        } else if self.trace {
            LogPreset::Trace
        } else if self.debug {
            LogPreset::Debug
        } else if self.verbose {
            LogPreset::Verbose
        } else {
            LogPreset::Normal
        }
    }

    /// Parsed `--log` overrides as `(full target, level)`. Malformed entries
    /// are skipped.
    pub fn parsed_overrides(&self) -> Vec<(String, LevelFilter)> {
        self.overrides
            .iter()
            .flat_map(|arg| arg.split(','))
            .filter_map(|part| {
                let (target, level) = part.split_once('=')?;
                let level = level.trim().parse::<LevelFilter>().ok()?;
                Some((qualify_target(target.trim()), level))
            })
            .collect()
    }

    /// Filter directives for this configuration, without consulting the
    /// environment.
    pub fn directives(&self) -> String {
        let mut directives: Vec<String> = self
            .preset()
            .directives()
            .iter()
            .map(|d| d.to_string())
            .collect();
        directives.extend(
            self.parsed_overrides()
                .into_iter()
                .map(|(target, level)| format!("{}={}", target, level)),
        );
        directives.join(",")
    }

    pub fn build_filter(&self) -> EnvFilter {
        if let Ok(filter) = EnvFilter::try_from_default_env() {
            return filter;
        }
        EnvFilter::try_new(self.directives()).unwrap_or_else(|_| EnvFilter::new("warn"))
    }
}

/// `jobs` -> `basket::jobs`; already-qualified and third-party targets pass
/// through.
fn qualify_target(target: &str) -> String {
    if target == TARGET_ROOT
        || target.starts_with("basket::")
        || matches!(target, "reqwest" | "hyper")
    {
        target.to_string()
    } else {
        format!("{}::{}", TARGET_ROOT, target)
    }
}

/// Install the global subscriber.
pub fn init(args: &LogArgs) {
    let filter = args.build_filter();

    match args.format {
        LogFormat::Text => {
            tracing_subscriber::registry()
                .with(filter)
                .with(
                    fmt::layer()
                        .with_writer(std::io::stderr)
                        .with_target(true)
                        .with_thread_ids(false),
                )
                .init();
        }
        LogFormat::Json => {
            tracing_subscriber::registry()
                .with(filter)
                .with(
                    fmt::layer()
                        .json()
                        .with_writer(std::io::stderr)
                        .with_target(true)
                        .with_span_events(FmtSpan::CLOSE),
                )
                .init();
        }
    }
}
