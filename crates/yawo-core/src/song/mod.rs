//! Song data read from the status file and what the overlay derives from it.

mod enriched;
mod instrument;
mod record;

pub use enriched::*;
pub use instrument::*;
pub use record::*;
