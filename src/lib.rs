pub mod config;
pub mod encode;
pub mod logger;
pub mod properties;
pub mod query;
pub mod runner;
#[doc(hidden)]
pub mod testing;
pub mod window;
pub use logger::{LogLogger, Logger};
pub use metric::{columns, metric_columns, DataPoint, MetricRow, Row};
pub use properties::Properties;
pub use runner::{run_queries, run_query, Error, Queries, Runner};
pub use window::Window;

mod metric;
