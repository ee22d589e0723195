/*!
# tsviz - Time-Series Query Templating & Chart Synthesis

tsviz sits between a user-authored SQL query / visualization intent and the
concrete artifacts consumed downstream: interpolated SQL text and a
declarative chart specification.

## Example

```rust
use tsviz::interpolate::{interpolate, InterpolateContext};
use tsviz::time::TimeRangeDescriptor;

let ctx = InterpolateContext {
    time_column: Some("__timestamp".to_string()),
    time_range: Some(TimeRangeDescriptor::Query {
        from: "now-1h".to_string(),
        to: "now".to_string(),
        enabled: None,
    }),
    ..InterpolateContext::default()
};
let result = interpolate("SELECT v FROM metrics WHERE $__timeFilter", &ctx);
assert!(result.has_time_variables);
assert!(!result.query.contains("$__timeFilter"));
```

## Architecture

Raw query text, a time-range descriptor, and optional schema hints flow
through validation and macro interpolation to produce executable SQL plus a
diagnostics record. Independently, query result rows flow through column
analysis into chart configuration synthesis.

## Core Components

- [`time`] - timestamp precision model and time-range resolution
- [`analyze`] - result-column classification into field metadata
- [`interpolate`] - time-macro substitution into raw SQL text
- [`validate`] - advisory pre-flight checks for macro-bearing queries
- [`chart`] - chart configuration values and render-spec synthesis
- [`writer`] - pluggable render-spec writers (ECharts-flavoured by default)

Every operation is a synchronous, pure transformation from inputs to outputs;
nothing here executes queries, performs I/O, or persists state between
invocations. Failure is represented as data (`None`, empty lists, an `errors`
list) rather than thrown across the public boundary, because the core is
called from interactive code that must never crash on malformed input.
*/

pub mod analyze;
pub mod chart;
pub mod interpolate;
pub mod naming;
pub mod time;
pub mod validate;
pub mod writer;

// Re-export key types for convenience
pub use analyze::{analyze, ColumnDescriptor, ContentType, FieldInfo, FieldRole, SemanticType};
pub use chart::{
    auto_detect_mapping, synthesize, ChartConfiguration, ChartKind, FieldMapping, Styling,
    TimeFormatting,
};
pub use interpolate::{interpolate, Interpolated, InterpolateContext};
pub use time::{resolve, ResolvedRange, TimeRangeDescriptor, TimeUnit};
pub use validate::{validate, Validation};

/// A flat result row: column name to scalar value.
pub type Row = serde_json::Map<String, serde_json::Value>;

/// Main library error type
#[derive(thiserror::Error, Debug)]
pub enum TsvizError {
    #[error("Interpolation error: {0}")]
    InterpolationError(String),

    #[error("Analysis error: {0}")]
    AnalysisError(String),

    #[error("Chart synthesis error: {0}")]
    SynthesisError(String),

    #[error("Internal error: {0}")]
    InternalError(String),
}

pub type Result<T> = std::result::Result<T, TsvizError>;

/// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
