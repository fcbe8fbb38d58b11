pub mod classifier;
pub use classifier::{TrendClassifier, TrendDirection, TrendingQuery};

pub mod clock;
pub use clock::{Clock, ManualClock, SystemClock};

pub mod maintenance;
pub use maintenance::{MaintenanceJob, MaintenanceReport, MaintenanceStep, StepStatus};

pub mod normalizer;
pub use normalizer::{QueryNormalizer, normalize};

pub mod tracker;
pub use tracker::{TrackOutcome, TrendTracker};

pub mod trend_service;
pub mod trend_service_impl;
pub use trend_service::{TrendError, TrendService};
pub use trend_service_impl::SeaOrmTrendService;

pub mod scheduler;
pub use scheduler::Scheduler;
