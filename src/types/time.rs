use arrow::datatypes::TimeUnit;

use crate::error::Result;

/// Days from 1970-01-01 to 2000-01-01, the epoch of `DATE` values on the wire.
pub const DATE_EPOCH_DAYS: i32 = 10_957;

/// Microseconds from 1970-01-01 to 2000-01-01, the epoch of `TIMESTAMP` values on the wire.
pub const TIMESTAMP_EPOCH_MICROS: i64 = 946_684_800_000_000;

pub const MAX_SAFE_SECONDS_TO_MICROS: i64 = 9_223_372_036_854;
pub const MIN_SAFE_SECONDS_TO_MICROS: i64 = -9_223_372_036_854;

pub const MAX_SAFE_MILLIS_TO_MICROS: i64 = 9_223_372_036_854_775;
pub const MIN_SAFE_MILLIS_TO_MICROS: i64 = -9_223_372_036_854_775;

pub const MAX_SAFE_MICROS_TO_NANOS: i64 = 9_223_372_036_854_775;
pub const MIN_SAFE_MICROS_TO_NANOS: i64 = -9_223_372_036_854_775;

pub fn seconds_to_micros(seconds: i64) -> Result<i64> {
    if !(MIN_SAFE_SECONDS_TO_MICROS..=MAX_SAFE_SECONDS_TO_MICROS).contains(&seconds) {
        return Err(err_overflow!(
            "{seconds} seconds would overflow when converting to microseconds"
        ));
    }

    Ok(seconds * 1_000_000)
}

pub fn millis_to_micros(millis: i64) -> Result<i64> {
    if !(MIN_SAFE_MILLIS_TO_MICROS..=MAX_SAFE_MILLIS_TO_MICROS).contains(&millis) {
        return Err(err_overflow!(
            "{millis} milliseconds would overflow when converting to microseconds"
        ));
    }

    Ok(millis * 1_000)
}

pub fn micros_to_nanos(micros: i64) -> Result<i64> {
    if !(MIN_SAFE_MICROS_TO_NANOS..=MAX_SAFE_MICROS_TO_NANOS).contains(&micros) {
        return Err(err_overflow!(
            "{micros} microseconds would overflow when converting to nanoseconds"
        ));
    }

    Ok(micros * 1_000)
}

/// Converts a count of `unit` to microseconds; nanoseconds are truncated toward zero.
pub fn to_micros(value: i64, unit: TimeUnit) -> Result<i64> {
    match unit {
        TimeUnit::Second => seconds_to_micros(value),
        TimeUnit::Millisecond => millis_to_micros(value),
        TimeUnit::Microsecond => Ok(value),
        TimeUnit::Nanosecond => Ok(value / 1_000),
    }
}

/// Converts a Unix timestamp in `unit` to microseconds since the wire epoch.
pub fn unix_to_wire_timestamp(value: i64, unit: TimeUnit) -> Result<i64> {
    let micros = to_micros(value, unit)?;

    micros
        .checked_sub(TIMESTAMP_EPOCH_MICROS)
        .ok_or_else(|| err_overflow!("timestamp {value} ({unit:?}) would underflow"))
}

/// Converts microseconds since the wire epoch to Unix microseconds.
pub fn wire_to_unix_timestamp(micros: i64) -> Result<i64> {
    micros
        .checked_add(TIMESTAMP_EPOCH_MICROS)
        .ok_or_else(|| err_overflow!("timestamp {micros} would overflow"))
}

#[cfg(test)]
mod tests {
    use arrow::datatypes::TimeUnit;

    use super::*;
    use crate::Error;

    #[test]
    fn seconds_boundary() {
        assert_eq!(
            seconds_to_micros(9_223_372_036_854).ok(),
            Some(9_223_372_036_854_000_000)
        );
        assert_eq!(
            seconds_to_micros(-9_223_372_036_854).ok(),
            Some(-9_223_372_036_854_000_000)
        );
        assert!(matches!(
            seconds_to_micros(9_223_372_036_855),
            Err(Error::NumericOverflow(_))
        ));
        assert!(matches!(
            seconds_to_micros(-9_223_372_036_855),
            Err(Error::NumericOverflow(_))
        ));
    }

    #[test]
    fn millis_and_micros_boundaries() {
        assert!(millis_to_micros(MAX_SAFE_MILLIS_TO_MICROS).is_ok());
        assert!(millis_to_micros(MAX_SAFE_MILLIS_TO_MICROS + 1).is_err());
        assert!(micros_to_nanos(MIN_SAFE_MICROS_TO_NANOS).is_ok());
        assert!(micros_to_nanos(MIN_SAFE_MICROS_TO_NANOS - 1).is_err());
    }

    #[test]
    fn timestamps_shift_by_the_epoch() -> crate::Result<()> {
        assert_eq!(unix_to_wire_timestamp(946_684_800, TimeUnit::Second)?, 0);
        assert_eq!(unix_to_wire_timestamp(1_500, TimeUnit::Nanosecond)?, -TIMESTAMP_EPOCH_MICROS + 1);
        assert_eq!(wire_to_unix_timestamp(0)?, TIMESTAMP_EPOCH_MICROS);
        assert!(unix_to_wire_timestamp(i64::MIN, TimeUnit::Microsecond).is_err());
        assert!(wire_to_unix_timestamp(i64::MAX).is_err());

        Ok(())
    }
}
