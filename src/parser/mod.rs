//! Text parsers for the free-form values found on paysheets
//!
//! - [`period`]: period labels (`06/01-06/07/2025`, `06/15/25`) and the
//!   anchored month filter
//! - [`numeric`]: tolerant number extraction (`$1,234.56`, `(500)`) and
//!   multiplier input (`1/2`, `50%`)
//! - [`date`]: calendar dates typed into cells or passed on the command line
//!
//! Every parser is fail-soft: malformed input produces `None`, `0.0` or a
//! [`SkipReason`](crate::error::SkipReason), never a panic.

pub mod date;
pub mod numeric;
pub mod period;

pub use date::parse_date_text;
pub use numeric::{coerce_number, first_numeric_token, parse_amount_text, parse_multiplier};
pub use period::{matches_month, parse_period, period_of_cell};
