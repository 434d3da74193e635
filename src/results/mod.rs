pub mod writer;
pub mod aggregator;

pub use writer::{result_file_name, ResultWriter, RESULT_FILE_PATTERN};
pub use aggregator::{aggregate, collect_worker_results, WorkerResults, FINAL_RESULTS_FILE};
