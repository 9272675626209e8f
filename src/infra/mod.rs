//! HTTP implementations of the [`crate::services`] traits.

pub mod backend;
pub mod openweather;
pub mod restcountries;
