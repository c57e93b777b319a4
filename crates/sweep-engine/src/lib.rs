//! Batch run coordination for the sweep retention engine.
//!
//! A run walks the policy catalog in order and, for every policy, executes
//! the delete pass followed by the anonymize pass. All mutations of one run
//! share a single logical transaction: the run commits only when every
//! action succeeded, otherwise everything rolls back and the accumulated
//! errors become the failure report.
//!
//! The engine is deliberately sequential. Candidates are processed one at a
//! time so the per-run dedup set can stay a plain collection owned by the
//! coordinator.

pub mod audit;
pub mod clock;
pub mod coordinator;
pub mod executor;
pub mod memory;
pub mod selector;
pub mod store;

pub use audit::{MemoryRunLog, RunEvent, RunEventOutcome, RunLog, TracingRunLog};
pub use clock::{Clock, FixedClock, SystemClock};
pub use coordinator::{RunCoordinator, RunError, RunReport, RunStatus};
pub use executor::CandidateOutcome;
pub use memory::MemoryStore;
pub use store::{EntityStore, StoreError};
