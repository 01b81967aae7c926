pub mod aggregator;
pub mod domain;
pub mod ports;
pub mod prompt;

pub use aggregator::{merge_daily_report, summarize_window, AggregateError, MergeOutcome, WindowSummary};
pub use domain::{day_index, DayEntry, DayIndex, Symptom, SymptomCounts, User, UserCredentials, ZipRecord};
pub use ports::{DatabaseService, PortError, PortResult, TextGenerationService, ZipMetadataService};
pub use prompt::{build_outbreak_prompt, OutbreakContext, ANALYST_SYSTEM_PROMPT};
