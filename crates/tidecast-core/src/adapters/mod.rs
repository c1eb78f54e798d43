//! Provider adapters.
//!
//! One adapter ships today: Yahoo Finance daily history. The [`crate::PriceProvider`]
//! trait keeps the seam open for alternatives.

mod yahoo;

pub use yahoo::YahooDailyAdapter;
