use std::path::Path;
use std::process::Stdio;

use futures::future::join_all;
use tokio::process::Command;
use tracing::{info, warn};

use super::state::WorkerId;
use crate::errors::FabricError;

/// Round-robin slice of `items` owned by `shard` out of `shards`.
pub fn select_shard<T>(items: Vec<T>, shard: usize, shards: usize) -> Vec<T> {
    let shards = shards.max(1);
    items
        .into_iter()
        .enumerate()
        .filter(|(i, _)| i % shards == shard)
        .map(|(_, item)| item)
        .collect()
}

/// Command line for one spawned worker process.
#[derive(Debug, Clone)]
pub struct WorkerInvocation {
    pub worker_id: WorkerId,
    pub shard: usize,
    pub shards: usize,
    pub session_id: String,
    pub filter: Option<String>,
    /// Global flags forwarded so the worker resolves the same settings.
    pub passthrough: Vec<String>,
}

impl WorkerInvocation {
    pub fn args(&self) -> Vec<String> {
        let mut args = vec![
            "worker".to_string(),
            "--worker-id".to_string(),
            self.worker_id.to_string(),
            "--shard".to_string(),
            self.shard.to_string(),
            "--shards".to_string(),
            self.shards.to_string(),
            "--session-id".to_string(),
            self.session_id.clone(),
        ];
        if let Some(filter) = &self.filter {
            args.push("--filter".to_string());
            args.push(filter.clone());
        }
        args.extend(self.passthrough.iter().cloned());
        args
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WorkerStatus {
    Passed,
    /// Exited non-zero; the code is kept for the log.
    Failed(i32),
    Crashed(String),
}

impl WorkerStatus {
    pub fn is_success(&self) -> bool {
        matches!(self, WorkerStatus::Passed)
    }
}

/// Launch every worker as a child of `exe` and wait for all of them.
///
/// Workers share nothing but the results directory; none waits on another.
pub async fn spawn_workers(
    exe: &Path,
    invocations: Vec<WorkerInvocation>,
) -> Result<Vec<(WorkerId, WorkerStatus)>, FabricError> {
    let mut running = Vec::with_capacity(invocations.len());
    for inv in invocations {
        let child = Command::new(exe)
            .args(inv.args())
            .stdin(Stdio::null())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| FabricError::Session(format!("Failed to spawn worker {}: {}", inv.worker_id, e)))?;
        info!(worker_id = %inv.worker_id, shard = inv.shard, pid = ?child.id(), "Spawned worker");
        running.push((inv.worker_id, child));
    }

    let waits = running.into_iter().map(|(id, mut child)| async move {
        let status = match child.wait().await {
            Ok(s) if s.success() => WorkerStatus::Passed,
            Ok(s) => match s.code() {
                Some(code) => WorkerStatus::Failed(code),
                None => WorkerStatus::Crashed("terminated by signal".to_string()),
            },
            Err(e) => WorkerStatus::Crashed(e.to_string()),
        };
        if let WorkerStatus::Crashed(reason) = &status {
            warn!(worker_id = %id, reason = %reason, "Worker did not exit normally");
        }
        (id, status)
    });
    Ok(join_all(waits).await)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_round_robin_covers_everything_once() {
        let items: Vec<usize> = (0..10).collect();
        let shards: Vec<Vec<usize>> = (0..3).map(|s| select_shard(items.clone(), s, 3)).collect();
        assert_eq!(shards[0], vec![0, 3, 6, 9]);
        assert_eq!(shards[1], vec![1, 4, 7]);
        assert_eq!(shards[2], vec![2, 5, 8]);
        let mut all: Vec<usize> = shards.concat();
        all.sort();
        assert_eq!(all, items);
    }

    #[test]
    fn test_single_shard_keeps_all() {
        assert_eq!(select_shard(vec!["a", "b"], 0, 1), vec!["a", "b"]);
        assert_eq!(select_shard(vec!["a", "b"], 0, 0), vec!["a", "b"]);
    }

    #[test]
    fn test_invocation_args() {
        let inv = WorkerInvocation {
            worker_id: WorkerId::for_shard(1),
            shard: 1,
            shards: 4,
            session_id: "abc".into(),
            filter: Some("Sales".into()),
            passthrough: vec!["--environment".into(), "gov".into()],
        };
        assert_eq!(
            inv.args(),
            vec![
                "worker", "--worker-id", "gw1", "--shard", "1", "--shards", "4",
                "--session-id", "abc", "--filter", "Sales", "--environment", "gov",
            ]
        );
    }
}
