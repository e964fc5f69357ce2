//! Pod states and their schedule status counterparts

use std::fmt::Display;
use std::str::FromStr;

use kestrel_core::ScheduleStatus;

use crate::error::BridgeError;

/// Pod state as named by the native scheduler (`POD_STATE_*`)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PodState {
    Invalid,
    Initialized,
    Pending,
    Launched,
    Starting,
    Running,
    Succeeded,
    Failed,
    Lost,
    Preempting,
    Killing,
    Killed,
    Deleted,
}

impl PodState {
    pub const ALL: [PodState; 13] = [
        PodState::Invalid,
        PodState::Initialized,
        PodState::Pending,
        PodState::Launched,
        PodState::Starting,
        PodState::Running,
        PodState::Succeeded,
        PodState::Failed,
        PodState::Lost,
        PodState::Preempting,
        PodState::Killing,
        PodState::Killed,
        PodState::Deleted,
    ];

    /// Wire name, e.g. `POD_STATE_RUNNING`
    pub fn as_str(&self) -> &'static str {
        match self {
            PodState::Invalid => "POD_STATE_INVALID",
            PodState::Initialized => "POD_STATE_INITIALIZED",
            PodState::Pending => "POD_STATE_PENDING",
            PodState::Launched => "POD_STATE_LAUNCHED",
            PodState::Starting => "POD_STATE_STARTING",
            PodState::Running => "POD_STATE_RUNNING",
            PodState::Succeeded => "POD_STATE_SUCCEEDED",
            PodState::Failed => "POD_STATE_FAILED",
            PodState::Lost => "POD_STATE_LOST",
            PodState::Preempting => "POD_STATE_PREEMPTING",
            PodState::Killing => "POD_STATE_KILLING",
            PodState::Killed => "POD_STATE_KILLED",
            PodState::Deleted => "POD_STATE_DELETED",
        }
    }

    /// The matching schedule status, if there is one
    ///
    /// Deleted pods report as killed. `Invalid` has no counterpart.
    pub fn schedule_status(&self) -> Option<ScheduleStatus> {
        let status = match self {
            PodState::Invalid => return None,
            PodState::Initialized => ScheduleStatus::Init,
            PodState::Pending => ScheduleStatus::Pending,
            PodState::Launched => ScheduleStatus::Assigned,
            PodState::Starting => ScheduleStatus::Starting,
            PodState::Running => ScheduleStatus::Running,
            PodState::Succeeded => ScheduleStatus::Finished,
            PodState::Failed => ScheduleStatus::Failed,
            PodState::Lost => ScheduleStatus::Lost,
            PodState::Preempting => ScheduleStatus::Preempting,
            PodState::Killing => ScheduleStatus::Killing,
            PodState::Killed | PodState::Deleted => ScheduleStatus::Killed,
        };
        Some(status)
    }
}

impl FromStr for PodState {
    type Err = BridgeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        PodState::ALL
            .into_iter()
            .find(|state| state.as_str() == s)
            .ok_or_else(|| BridgeError::UnknownState(s.to_string()))
    }
}

impl Display for PodState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Map a pod state name to a schedule status
pub fn schedule_status_from_pod_state(state: &str) -> Result<ScheduleStatus, BridgeError> {
    state
        .parse::<PodState>()?
        .schedule_status()
        .ok_or_else(|| BridgeError::UnknownState(state.to_string()))
}
