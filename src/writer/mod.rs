//! Render-spec writer abstraction for tsviz.
//!
//! A writer turns a chart configuration plus result rows into a declarative
//! spec for a concrete rendering engine. The engine consumes the spec
//! verbatim and is solely responsible for pixels; this core treats the output
//! as an opaque value.
//!
//! # Example
//!
//! ```rust,ignore
//! use tsviz::writer::{EChartsWriter, Writer};
//!
//! let writer = EChartsWriter::new();
//! let spec = writer.write(&rows, &config, &[])?;
//! ```

use crate::chart::ChartConfiguration;
use crate::{Result, Row};

pub mod echarts;

pub use echarts::EChartsWriter;

/// Trait for chart render-spec writers.
pub trait Writer {
    /// The spec type produced by this writer.
    type Output;

    /// Generate a render spec from result rows and a configuration.
    ///
    /// # Errors
    ///
    /// Returns `TsvizError::SynthesisError` when the configuration cannot be
    /// satisfied by the rows (for example, a mapped field that no row
    /// carries). Callers at the public boundary degrade this to a `None`
    /// render spec.
    fn write(
        &self,
        rows: &[Row],
        config: &ChartConfiguration,
        theme_colors: &[String],
    ) -> Result<Self::Output>;

    /// Validate that a configuration is renderable by this writer without
    /// generating output.
    fn validate(&self, config: &ChartConfiguration) -> Result<()>;
}
