//! Wire representations of the types that need more than a byte swap.
//!
//! | Netezza type | Rust type       | Arrow type                  |
//! |--------------|-----------------|-----------------------------|
//! | `NUMERIC`    | [`NzNumeric`]   | `Utf8`                      |
//! | `INTERVAL`   | [`NzInterval`]  | `Interval(MonthDayNano)`    |
//! | `DATE`       | `i32` (days)    | `Date32`                    |
//! | `TIMESTAMP`  | `i64` (µs)      | `Timestamp(Microsecond)`    |

mod interval;
mod numeric;
pub mod time;

pub use interval::{MonthDayNano, NzInterval};
pub use numeric::{NzNumeric, NzNumericSign};
