//! Tracing setup for applications built on the proxy.
//!
//! The library itself only emits events; an application should call
//! [`init_journald_or_stdout`] once at startup to install a subscriber.
//! Modules use `use crate::tracing::prelude::*` for the `trace!()` through
//! `error!()` macros.
//!
//! Proxy operations log at DEBUG, raw request and reply payloads at TRACE,
//! and negative acknowledgements at WARN.

use std::env;
use time::OffsetDateTime;
use tracing_subscriber::{
    filter::{EnvFilter, LevelFilter},
    fmt::{format::Writer, time::FormatTime},
    prelude::*,
};

pub mod prelude {
    #[allow(unused_imports)]
    pub use tracing::{debug, error, info, trace, warn};
}

use prelude::*;

/// Filter variable checked before `RUST_LOG`.
const LOG_VAR: &str = "SWITCHBOARD_LOG";

/// Install a global subscriber.
///
/// Under systemd (`JOURNAL_STREAM` set) events go to journald, otherwise to
/// stdout. Returns false if a global subscriber was already installed.
pub fn init_journald_or_stdout() -> bool {
    if env::var("JOURNAL_STREAM").is_ok() {
        match tracing_journald::layer() {
            Ok(layer) => return tracing_subscriber::registry().with(layer).try_init().is_ok(),
            Err(e) => {
                let installed = use_stdout();
                error!("Failed to initialize journald logging ({e}), using stdout.");
                return installed;
            }
        }
    }
    use_stdout()
}

// Filter from SWITCHBOARD_LOG, else RUST_LOG, defaulting to INFO.
fn use_stdout() -> bool {
    let var = if env::var(LOG_VAR).is_ok() { LOG_VAR } else { "RUST_LOG" };
    let env_filter = EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .with_env_var(var)
        .from_env_lossy();

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer().with_timer(LocalTimer))
        .try_init()
        .is_ok()
}

// Local time to the millisecond; request/reply exchanges are much shorter
// than a second.
struct LocalTimer;

impl FormatTime for LocalTimer {
    fn format_time(&self, w: &mut Writer<'_>) -> std::fmt::Result {
        let now = OffsetDateTime::now_local().unwrap_or(OffsetDateTime::now_utc());
        let formatted = now
            .format(time::macros::format_description!(
                "[hour]:[minute]:[second].[subsecond digits:3]"
            ))
            .map_err(|_| std::fmt::Error)?;
        write!(w, "{formatted}")
    }
}
