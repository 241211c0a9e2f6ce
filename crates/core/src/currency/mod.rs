//! Multi-currency handling and exchange rates.

pub mod conversion;
pub mod rate;

pub use conversion::{
    ConversionError, DISPLAY_DECIMAL_PLACES, convert_to_base, round_for_display, try_convert_to_base,
};
pub use rate::{ExchangeRateTable, RateError, ReverseRate};
