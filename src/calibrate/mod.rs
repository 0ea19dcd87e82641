//! Calibration engine: reference sampling, convergence search, batching
// (c) 2024 Ross Younger
//!
//! Entry point is [`run`], which calibrates one or all of a camera's pixel
//! formats and returns a [`RunReport`]. The pieces are usable separately:
//! [`find_delay`] drives a single search against a prepared camera,
//! reporting progress through a [`SearchObserver`].

mod batch;
mod events;
mod reference;
mod results;
mod search;
mod types;

pub use batch::run;
pub use events::{NullObserver, SearchObserver};
pub use results::RunReport;
pub use search::{find_delay, rates_match, RATE_TOLERANCE, REQUIRED_MATCHES};
pub use types::{CalibrationResult, CalibrationState};
