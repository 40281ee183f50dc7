pub mod decision;
pub mod resolution;
pub mod similar;
pub mod team;
pub mod ticket;

pub use decision::*;
pub use resolution::*;
pub use similar::*;
pub use team::*;
pub use ticket::*;
