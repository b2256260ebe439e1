use crate::utils::config::LogFormat;
use tracing::Subscriber;
use tracing_subscriber::{
    EnvFilter, fmt::writer::BoxMakeWriter, layer::SubscriberExt, util::SubscriberInitExt,
};

/// Where log lines are written
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogTarget {
    #[default]
    Stdout,
    /// Keeps logs out of an interactive transcript on stdout
    Stderr,
}

impl LogTarget {
    fn make_writer(self) -> BoxMakeWriter {
        match self {
            LogTarget::Stdout => BoxMakeWriter::new(std::io::stdout),
            LogTarget::Stderr => BoxMakeWriter::new(std::io::stderr),
        }
    }
}

/// Install the global tracing subscriber.
///
/// `RUST_LOG` takes precedence over `default_level`, which applies to this
/// crate and to the HTTP trace layer.
pub fn init_tracing(default_level: &str, format: LogFormat, target: LogTarget) {
    build_subscriber(default_level, format, target.make_writer()).init();
}

fn build_subscriber(
    default_level: &str,
    format: LogFormat,
    writer: BoxMakeWriter,
) -> impl Subscriber + Send + Sync + 'static {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(format!(
            "ledger_agents={level},tower_http={level},rmcp=warn",
            level = default_level
        ))
    });

    let (pretty, json) = match format {
        LogFormat::Pretty => (
            Some(tracing_subscriber::fmt::layer().with_writer(writer)),
            None,
        ),
        LogFormat::Json => (
            None,
            Some(tracing_subscriber::fmt::layer().json().with_writer(writer)),
        ),
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(pretty)
        .with(json)
}
