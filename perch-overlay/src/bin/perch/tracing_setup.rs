//! Tracing configuration for the perch binary.
//!
//! The configured level applies to the perch crates only; everything else is
//! held at `warn`. Events from perch targets whose formatted text contains one
//! of the suppressed patterns are dropped, which keeps per-frame chatter
//! (candidate scores, event dispatch, pointer moves) out of the output.

use std::fs::File;
use std::io;
use std::sync::Mutex;

use perch_overlay::LoggingConfig;
use tracing::{Event, Subscriber};
use tracing_subscriber::fmt::format::Writer;
use tracing_subscriber::fmt::{self, FmtContext, FormatEvent, FormatFields};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::registry::LookupSpan;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

/// Targets the configured level and suppressed patterns apply to.
const PERCH_TARGETS: [&str; 3] = ["perch_core", "perch_overlay", "perch"];

/// `EnvFilter` directives used when `RUST_LOG` is unset.
fn default_directives(level: &str) -> String {
    let mut directives = String::from("warn");
    for target in PERCH_TARGETS {
        directives.push_str(&format!(",{target}={level}"));
    }
    directives
}

fn is_perch_target(target: &str) -> bool {
    PERCH_TARGETS.iter().any(|crate_name| {
        target
            .strip_prefix(crate_name)
            .is_some_and(|rest| rest.is_empty() || rest.starts_with("::"))
    })
}

/// Event formatter that drops perch messages containing a suppressed pattern.
struct FilteringFormatter {
    inner: fmt::format::Format,
    suppressed_patterns: Vec<String>,
}

impl FilteringFormatter {
    fn new(suppressed_patterns: Vec<String>) -> Self {
        Self {
            inner: fmt::format::Format::default().with_target(true),
            suppressed_patterns,
        }
    }

    fn suppresses(&self, target: &str, formatted: &str) -> bool {
        is_perch_target(target)
            && self
                .suppressed_patterns
                .iter()
                .any(|pattern| formatted.contains(pattern.as_str()))
    }
}

impl<S, N> FormatEvent<S, N> for FilteringFormatter
where
    S: Subscriber + for<'a> LookupSpan<'a>,
    N: for<'a> FormatFields<'a> + 'static,
{
    fn format_event(
        &self,
        ctx: &FmtContext<'_, S, N>,
        mut writer: Writer<'_>,
        event: &Event<'_>,
    ) -> std::fmt::Result {
        let mut message_buf = String::new();
        self.inner
            .format_event(ctx, Writer::new(&mut message_buf), event)?;

        if self.suppresses(event.metadata().target(), &message_buf) {
            Ok(())
        } else {
            write!(writer, "{message_buf}")
        }
    }
}

/// Install the global subscriber described by `config`.
///
/// `RUST_LOG` takes precedence over the configured level. An unparsable level
/// falls back to `info`. Output goes to the
/// configured log file, or to stderr when none is set or it cannot be created.
///
/// # Panics
///
/// Panics if a global subscriber has already been set.
#[allow(clippy::print_stderr)]
pub fn init(config: &LoggingConfig) {
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(default_directives(&config.level)))
        .unwrap_or_else(|err| {
            eprintln!("Warning: invalid log level `{}`: {err}", config.level);
            EnvFilter::new(default_directives("info"))
        });
    let suppressed = config.suppressed_patterns.clone();

    let log_file = config.log_file.as_ref().and_then(|path| {
        File::create(path)
            .inspect_err(|err| eprintln!("Warning: cannot create {}: {err}", path.display()))
            .ok()
    });

    if let Some(log_file) = log_file {
        let fmt_layer = fmt::layer()
            .with_ansi(false)
            .with_writer(Mutex::new(log_file))
            .event_format(FilteringFormatter::new(suppressed));

        tracing_subscriber::registry()
            .with(env_filter)
            .with(fmt_layer)
            .init();
    } else {
        let fmt_layer = fmt::layer()
            .with_writer(io::stderr)
            .event_format(FilteringFormatter::new(suppressed));

        tracing_subscriber::registry()
            .with(env_filter)
            .with(fmt_layer)
            .init();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn suppresses_configured_patterns_only() {
        let formatter = FilteringFormatter::new(LoggingConfig::default().suppressed_patterns);
        assert!(formatter.suppresses(
            "perch_core::position",
            "TRACE scored placement placement=top ratio=1"
        ));
        assert!(formatter.suppresses(
            "perch_overlay::events",
            "TRACE dispatching overlay event event=Closed"
        ));
        assert!(!formatter.suppresses(
            "perch_core::position",
            "DEBUG flipping placement from=bottom to=top"
        ));
    }

    #[test]
    fn foreign_targets_are_never_suppressed() {
        let formatter = FilteringFormatter::new(LoggingConfig::default().suppressed_patterns);
        assert!(!formatter.suppresses("clap", "TRACE scored placement"));
        assert!(!formatter.suppresses("perch_corex", "TRACE scored placement"));
        assert!(formatter.suppresses("perch", "TRACE scored placement"));
    }

    #[test]
    fn default_directives_scope_the_level_to_perch_crates() {
        let directives = default_directives("debug");
        assert_eq!(
            directives,
            "warn,perch_core=debug,perch_overlay=debug,perch=debug"
        );
        assert!(EnvFilter::try_new(&directives).is_ok());
        assert!(EnvFilter::try_new(default_directives("loud")).is_err());
    }
}
