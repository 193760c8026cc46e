//! # scheduler_engine
//!
//! Drives the event scheduler: a background loop that repeatedly decays,
//! re-ranks and processes events from the store, while callers add, remove,
//! halt and inspect events concurrently.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use scheduler_core::EventSpec;
//! use scheduler_engine::{EngineConfig, EngineLoop};
//!
//! #[tokio::main]
//! async fn main() {
//!     let (engine, mut reports) = EngineLoop::new(EngineConfig::default());
//!     let scheduler = engine.scheduler();
//!     let handle = tokio::spawn(engine.run());
//!
//!     scheduler.add(EventSpec::new("backup", 3, 45).unwrap()).await;
//!     scheduler.start().await;
//!
//!     while let Some(report) = reports.recv().await {
//!         println!("{report}");
//!     }
//!     handle.await.unwrap();
//! }
//! ```

pub mod config;
pub mod report;
pub mod runner;
pub mod scheduler;

pub use config::EngineConfig;
pub use report::{EngineReport, EventListing};
pub use runner::EngineLoop;
pub use scheduler::{Added, EngineState, Scheduler};
