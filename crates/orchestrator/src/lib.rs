//! Orchestrator - task generation, classification and probe execution

mod classifier;
mod orchestrator;
mod progress;
mod task_list;

pub use classifier::{annotate_host, DirectClassifier};
pub use orchestrator::{probe_task, Orchestrator};
pub use progress::ProgressTracker;
pub use task_list::TaskList;
