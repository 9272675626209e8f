//! Air-quality pipeline: raw provider payload → [`normalize`] → uniform
//! [`Measurement`]s → [`select_latest`] → headline reading → [`classify`] →
//! display attributes.
//!
//! Every step is pure and synchronous and none of them can fail.

pub mod classify;
pub mod normalize;
pub mod select;
pub mod types;
pub mod view;

pub use classify::{Classification, classify, classify_measurement};
pub use normalize::{Normalizer, normalize};
pub use select::{Selection, dedup_latest, select_latest};
pub use types::{Measurement, Tier, TierStyle, parse_timestamp};
pub use view::{AirQualityView, format_value};
