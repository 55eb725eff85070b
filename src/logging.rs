//! Tracing setup for hosts that embed the kernel.
//!
//! The kernel only emits `tracing` events, with targets under `trellis` and
//! messages named `kernel.*`. A host without a subscriber of its own can
//! install one from [`KernelConfig::log_filter`].

use tracing::Subscriber;
use tracing_subscriber::fmt::{self, MakeWriter};
use tracing_subscriber::EnvFilter;

use crate::error::{GraphError, Result};
use crate::storage::KernelConfig;

/// Parses an `EnvFilter` directive such as `"trellis=debug"`.
pub fn filter(directive: &str) -> Result<EnvFilter> {
    EnvFilter::try_new(directive).map_err(|e| {
        GraphError::InvalidArgument(format!("invalid log filter {directive:?}: {e}"))
    })
}

/// Builds a plain-text subscriber writing to `writer`, for scoped use with
/// [`tracing::subscriber::with_default`].
pub fn subscriber<W>(directive: &str, writer: W) -> Result<impl Subscriber + Send + Sync + 'static>
where
    W: for<'w> MakeWriter<'w> + Send + Sync + 'static,
{
    Ok(fmt::fmt()
        .with_env_filter(filter(directive)?)
        .with_target(true)
        .with_ansi(false)
        .with_writer(writer)
        .finish())
}

/// Installs the process-wide subscriber described by `config`, writing to
/// stderr. Fails if a global subscriber is already set.
pub fn init_logging(config: &KernelConfig) -> Result<()> {
    fmt::fmt()
        .with_env_filter(filter(&config.log_filter)?)
        .with_target(true)
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|e| GraphError::InvalidArgument(format!("logging already initialized: {e}")))
}
