pub mod service;

pub use service::{Clock, SystemClock, TeamBackend, TeamDirectory};
