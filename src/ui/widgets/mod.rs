// Custom widgets for the prompts

pub mod progress;

pub use progress::{EnhancedProgress, ProgressState};
