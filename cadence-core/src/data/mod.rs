//! Price data: validated raw series and calendar alignment.

pub mod align;
pub mod series;

pub use align::{align_to_calendar, AlignedSeries};
pub use series::{PriceSeries, SeriesError};
