//! Labelled forecast and observation arrays.

pub mod forecast;
pub mod observation;
pub mod slab;

pub use forecast::{ForecastInput, ForecastSource, InitializedForecast};
pub use observation::{Observation, ObservationInput, ObservationSource};
pub use slab::Slab;
