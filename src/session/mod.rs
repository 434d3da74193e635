pub mod state;
pub mod lock;
pub mod shard;
pub mod runner;
pub mod lifecycle;

pub use state::{SessionPhase, SessionRole, WorkerId};
pub use lock::CoordinatorLock;
pub use shard::{select_shard, spawn_workers, WorkerInvocation, WorkerStatus};
pub use runner::{run_report_case, run_worker, CaseOutcome, WorkerContext, WorkerSummary};
pub use lifecycle::{purge_stale_outputs, DocumentOpener, MetadataRefresher, RestMetadataRefresher, SessionController};
