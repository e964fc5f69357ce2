//! Workload lifecycle events
//!
//! [`PodEvent`] is the event shape produced by the native scheduler API,
//! [`TaskEvent`] the shape expected by the compatibility API.

use std::fmt::Display;

use serde::{Deserialize, Serialize};

/// A pod state transition as reported by the native scheduler
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct PodEvent {
    /// Name of the pod (`<job id>-<instance>`)
    pub pod_name: String,
    /// Observed state name, e.g. `POD_STATE_RUNNING`
    pub actual_state: String,
    /// Goal state name
    pub desired_state: String,
    /// RFC 3339 timestamp of the transition
    pub timestamp: String,
    /// Free-text message
    pub message: String,
    /// Machine-readable reason for the transition
    pub reason: String,
    /// Host the pod ran on
    pub hostname: String,
}

/// Task status in the compatibility API
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ScheduleStatus {
    Init,
    Throttled,
    Pending,
    Assigned,
    Starting,
    Running,
    Finished,
    Preempting,
    Restarting,
    Draining,
    Failed,
    Killed,
    Killing,
    Lost,
}

impl ScheduleStatus {
    /// Upper-case wire name of the status
    pub fn as_str(&self) -> &'static str {
        match self {
            ScheduleStatus::Init => "INIT",
            ScheduleStatus::Throttled => "THROTTLED",
            ScheduleStatus::Pending => "PENDING",
            ScheduleStatus::Assigned => "ASSIGNED",
            ScheduleStatus::Starting => "STARTING",
            ScheduleStatus::Running => "RUNNING",
            ScheduleStatus::Finished => "FINISHED",
            ScheduleStatus::Preempting => "PREEMPTING",
            ScheduleStatus::Restarting => "RESTARTING",
            ScheduleStatus::Draining => "DRAINING",
            ScheduleStatus::Failed => "FAILED",
            ScheduleStatus::Killed => "KILLED",
            ScheduleStatus::Killing => "KILLING",
            ScheduleStatus::Lost => "LOST",
        }
    }

    /// Whether the task has reached a final status
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            ScheduleStatus::Finished
                | ScheduleStatus::Failed
                | ScheduleStatus::Killed
                | ScheduleStatus::Lost
        )
    }
}

impl Display for ScheduleStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A task state transition in the compatibility API
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskEvent {
    /// Unix time of the transition in milliseconds
    pub timestamp_ms: i64,
    pub status: ScheduleStatus,
    pub message: String,
    /// Name of the scheduler that produced the event
    pub scheduler: String,
}
