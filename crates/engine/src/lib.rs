#![forbid(unsafe_code)]

pub mod achievements;
pub mod analytics;
pub mod bus;
pub mod config;
pub mod engine;
pub mod error;
pub mod timer;

pub use recall_core::Clock;

pub use analytics::{AnalyticsError, AnalyticsSink, HttpAnalytics, NullAnalytics, RecordingAnalytics};
pub use bus::{EventBus, SubscriptionId};
pub use config::EngineConfig;
pub use engine::{AnswerOutcome, HintOutcome, SessionEngine, SessionOptions};
pub use error::EngineError;
pub use timer::InactivityDriver;
