//! Core conversion logic and abstractions

pub mod cache;
pub mod config;
pub mod converter;
pub mod currency;
pub mod debounce;
pub mod display;
pub mod log;
pub mod orchestrator;
pub mod state;

// Re-export main types for cleaner imports
pub use converter::{Converter, ConverterHandle, ConverterSettings, ConverterView};
pub use currency::{ConversionQuote, ConversionRequest, Currency, CurrencyRateProvider};
pub use state::Side;
