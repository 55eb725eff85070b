use std::fs;
use std::path::Path;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use super::metrics::KernelMetrics;
use super::schema::{OpenSchema, Schema};
use super::table::{GrowthPolicy, MAX_CAPACITY};
use crate::error::{GraphError, Result};

/// Tunable kernel settings, loadable from TOML.
///
/// ```toml
/// initial_vertex_capacity = 1024
/// initial_edge_capacity = 4096
/// validate = false
/// log_filter = "trellis=info"
///
/// [growth]
/// double_below = 262144
/// mid_step = 262144
/// mid_limit = 1048576
/// high_step = 131072
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct KernelConfig {
    /// Vertex table capacity at construction.
    pub initial_vertex_capacity: usize,
    /// Edge table capacity at construction.
    pub initial_edge_capacity: usize,
    /// Growth schedule shared by both tables.
    pub growth: GrowthPolicy,
    /// Re-check free-list invariants after every id mutation.
    pub validate: bool,
    /// `EnvFilter` directive used by [`crate::logging::init_logging`].
    pub log_filter: String,
}

impl Default for KernelConfig {
    fn default() -> Self {
        Self {
            initial_vertex_capacity: 1000,
            initial_edge_capacity: 1000,
            growth: GrowthPolicy::default(),
            validate: false,
            log_filter: "trellis=info".into(),
        }
    }
}

impl KernelConfig {
    /// Parses and checks a TOML config.
    pub fn from_toml_str(text: &str) -> Result<Self> {
        let cfg: KernelConfig = toml::from_str(text)?;
        cfg.check()?;
        Ok(cfg)
    }

    /// Reads, parses and checks a TOML config file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let text = fs::read_to_string(path)?;
        Self::from_toml_str(&text)
    }

    /// Rejects out-of-range capacities, zero growth steps and bad log filters.
    pub fn check(&self) -> Result<()> {
        for (name, cap) in [
            ("initial_vertex_capacity", self.initial_vertex_capacity),
            ("initial_edge_capacity", self.initial_edge_capacity),
        ] {
            if cap > MAX_CAPACITY {
                return Err(GraphError::InvalidArgument(format!(
                    "{name} {cap} exceeds the id range"
                )));
            }
        }
        crate::logging::filter(&self.log_filter)?;
        let g = &self.growth;
        if g.mid_step == 0 || g.high_step == 0 {
            return Err(GraphError::InvalidArgument(
                "growth steps must be positive".into(),
            ));
        }
        if g.mid_limit < g.double_below {
            return Err(GraphError::InvalidArgument(
                "growth.mid_limit must not be below growth.double_below".into(),
            ));
        }
        Ok(())
    }
}

/// Options supplied when constructing a [`super::GraphKernel`].
#[derive(Clone)]
pub struct KernelOptions {
    /// Schema collaborator for end validation and ownership.
    pub schema: Arc<dyn Schema>,
    /// Capacities, growth and validation settings.
    pub config: KernelConfig,
    /// Optional metrics collection implementation.
    pub metrics: Option<Arc<dyn KernelMetrics>>,
}

impl Default for KernelOptions {
    fn default() -> Self {
        Self::new(Arc::new(OpenSchema))
    }
}

impl KernelOptions {
    /// Options using `schema` and the default config.
    pub fn new(schema: Arc<dyn Schema>) -> Self {
        Self {
            schema,
            config: KernelConfig::default(),
            metrics: None,
        }
    }

    /// Replaces the whole config.
    pub fn config(mut self, config: KernelConfig) -> Self {
        self.config = config;
        self
    }

    /// Sets the initial vertex capacity.
    pub fn vertex_capacity(mut self, capacity: usize) -> Self {
        self.config.initial_vertex_capacity = capacity;
        self
    }

    /// Sets the initial edge capacity.
    pub fn edge_capacity(mut self, capacity: usize) -> Self {
        self.config.initial_edge_capacity = capacity;
        self
    }

    /// Sets the growth schedule.
    pub fn growth(mut self, growth: GrowthPolicy) -> Self {
        self.config.growth = growth;
        self
    }

    /// Enables or disables the validating free-list mode.
    pub fn validate(mut self, enabled: bool) -> Self {
        self.config.validate = enabled;
        self
    }

    /// Attaches a metrics sink.
    pub fn metrics(mut self, metrics: Arc<dyn KernelMetrics>) -> Self {
        self.metrics = Some(metrics);
        self
    }
}
