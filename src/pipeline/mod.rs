pub mod runner;
pub mod state;

pub use runner::TicketPipeline;
pub use state::{PipelineOutcome, PipelineState, PipelineStatus, Stage};
