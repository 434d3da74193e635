use std::fmt;

use crate::errors::FabricError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionPhase {
    NotStarted,
    MetadataRefreshed,
    Scanning,
    Aggregating,
    Rendered,
    Done,
}

impl SessionPhase {
    pub fn as_str(&self) -> &'static str {
        match self {
            SessionPhase::NotStarted => "not_started",
            SessionPhase::MetadataRefreshed => "metadata_refreshed",
            SessionPhase::Scanning => "scanning",
            SessionPhase::Aggregating => "aggregating",
            SessionPhase::Rendered => "rendered",
            SessionPhase::Done => "done",
        }
    }

    /// Workers skip refresh and aggregation, so they may jump straight to scanning
    /// and from scanning to done.
    pub fn can_advance_to(&self, next: SessionPhase) -> bool {
        use SessionPhase::*;
        matches!(
            (self, next),
            (NotStarted, MetadataRefreshed)
                | (NotStarted, Scanning)
                | (MetadataRefreshed, Scanning)
                | (Scanning, Aggregating)
                | (Scanning, Done)
                | (Aggregating, Rendered)
                | (Rendered, Done)
        )
    }

    pub fn advance(&mut self, next: SessionPhase) -> Result<(), FabricError> {
        if !self.can_advance_to(next) {
            return Err(FabricError::Session(format!(
                "Invalid session transition {} -> {}",
                self.as_str(),
                next.as_str()
            )));
        }
        *self = next;
        Ok(())
    }
}

impl fmt::Display for SessionPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Partition key for result and screenshot files.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct WorkerId(String);

impl WorkerId {
    /// Sentinel used when the session runs without parallel workers.
    pub const MASTER: &'static str = "master";

    pub fn master() -> Self {
        Self(Self::MASTER.to_string())
    }

    pub fn for_shard(index: usize) -> Self {
        Self(format!("gw{}", index))
    }

    pub fn parse(raw: &str) -> Result<Self, FabricError> {
        let valid = !raw.is_empty()
            && raw.chars().all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
        if !valid {
            return Err(FabricError::Config(format!(
                "Invalid worker id '{}': use letters, digits, '-' or '_'",
                raw
            )));
        }
        Ok(Self(raw.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for WorkerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Whether this process owns the session or runs one shard of it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionRole {
    Coordinator,
    Worker(WorkerId),
}

impl SessionRole {
    pub fn is_coordinator(&self) -> bool {
        matches!(self, SessionRole::Coordinator)
    }
}
