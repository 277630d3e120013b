#![forbid(unsafe_code)]

//! Core domain model and advisory dispatch for the Wellness health log.
//!
//! This crate provides:
//! - Profile and daily check-in types with one-pass validation
//! - Derived metrics (BMI, protein target)
//! - Log aggregation into the multi-day digest
//! - The capability registry, dispatcher and safe-execution wrapper
//! - Persistence (in-memory and JSON files) and CSV export

pub mod error;
pub mod config;
pub mod logging;
pub mod metrics;
pub mod profile;
pub mod checkin;
pub mod digest;
pub mod capability;
pub mod templates;
pub mod generator;
pub mod safety;
pub mod dispatch;
pub mod store;
pub mod file_store;
pub mod export;
pub mod service;

// Re-export commonly used types
pub use error::{Error, ErrorKind, GenerationError, Result};
pub use config::Config;
pub use metrics::{compute_bmi, compute_protein_target, Bmi, BmiCategory, Goal};
pub use profile::{BudgetBand, Profile, ProfileDraft};
pub use checkin::{CheckIn, DailyLog, MealSlot, Meals, SleepRecord, Symptom};
pub use digest::{summarize, upsert_entry, Digest, Upsert};
pub use capability::{default_registry, Advisor, CapabilityKind, HistoryRequirement, Registry};
pub use generator::{Bindings, ChatGenerator, Generator, GeneratorFault};
pub use dispatch::Dispatcher;
pub use store::{MemoryStore, ProfileStore};
pub use file_store::FileStore;
pub use export::export_csv;
pub use service::{AdvisoryResponse, AdvisoryService};
