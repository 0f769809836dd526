pub mod builder;
pub mod registry;
pub mod schema;

pub use builder::MetricBuilder;
pub use registry::{MetricRegistry, MetricWrite};
pub use schema::{register_gpu_metrics, PowerUnit};
