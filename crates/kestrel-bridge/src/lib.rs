//! # Kestrel Bridge
//!
//! Translates pod lifecycle events from the native scheduler API into task
//! events of the compatibility API.
//!
//! ```rust,ignore
//! use kestrel_bridge::new_task_event;
//! use kestrel_core::{PodEvent, ScheduleStatus};
//!
//! let event = PodEvent {
//!     actual_state: "POD_STATE_LAUNCHED".to_string(),
//!     timestamp: "2019-01-03T22:14:58Z".to_string(),
//!     ..Default::default()
//! };
//! let task = new_task_event(&event).unwrap();
//! assert_eq!(task.status, ScheduleStatus::Assigned);
//! ```

pub mod error;
pub mod state;
pub mod task_event;

pub use error::BridgeError;
pub use state::{PodState, schedule_status_from_pod_state};
pub use task_event::{SCHEDULER_NAME, new_task_event};
