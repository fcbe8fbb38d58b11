pub mod trend;

pub use trend::{TrendRecord, TrendStats, TrendWindow};
