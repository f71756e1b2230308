use arrow::datatypes::{ArrowPrimitiveType, IntervalMonthDayNanoType};
use bytes::BufMut;

use crate::error::Result;
use crate::io::NzBufExt;
use crate::types::time::micros_to_nanos;

/// The Arrow representation of an interval.
pub type MonthDayNano = <IntervalMonthDayNanoType as ArrowPrimitiveType>::Native;

/// An `INTERVAL` as it appears on the wire.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
pub struct NzInterval {
    pub months: i32,
    pub days: i32,
    pub microseconds: i64,
}

impl NzInterval {
    pub const SIZE: usize = 16;

    pub fn decode(mut field: &[u8]) -> Result<Self> {
        if field.len() != Self::SIZE {
            return Err(err_malformed!(
                "expected field with {} bytes but found field with {} bytes",
                Self::SIZE,
                field.len()
            ));
        }

        let microseconds = field.get_checked::<i64>()?;
        let days = field.get_checked::<i32>()?;
        let months = field.get_checked::<i32>()?;

        Ok(NzInterval {
            months,
            days,
            microseconds,
        })
    }

    pub fn encode(&self, buf: &mut Vec<u8>) {
        buf.put_i64(self.microseconds);
        buf.put_i32(self.days);
        buf.put_i32(self.months);
    }

    /// Fails if the time component does not fit in nanoseconds.
    pub fn to_month_day_nano(self) -> Result<MonthDayNano> {
        let nanos = micros_to_nanos(self.microseconds)?;

        Ok(IntervalMonthDayNanoType::make_value(
            self.months,
            self.days,
            nanos,
        ))
    }

    /// Sub-microsecond precision is truncated.
    pub fn from_month_day_nano(value: MonthDayNano) -> Self {
        let (months, days, nanos) = IntervalMonthDayNanoType::to_parts(value);

        NzInterval {
            months,
            days,
            microseconds: nanos / 1_000,
        }
    }
}

#[cfg(test)]
mod tests {
    use arrow::datatypes::IntervalMonthDayNanoType;

    use super::NzInterval;

    const INTERVAL: &[u8] = &[
        0, 0, 0, 0, 0, 0x0f, 0x42, 0x40, // 1 second
        0, 0, 0, 3, // 3 days
        0, 0, 0, 2, // 2 months
    ];

    #[test]
    fn test_decode_interval() -> crate::Result<()> {
        let interval = NzInterval::decode(INTERVAL)?;

        assert_eq!(
            interval,
            NzInterval {
                months: 2,
                days: 3,
                microseconds: 1_000_000
            }
        );

        assert_eq!(
            IntervalMonthDayNanoType::to_parts(interval.to_month_day_nano()?),
            (2, 3, 1_000_000_000)
        );

        Ok(())
    }

    #[test]
    fn test_encode_interval() {
        let mut buf = Vec::new();

        NzInterval::from_month_day_nano(IntervalMonthDayNanoType::make_value(2, 3, 1_000_000_999))
            .encode(&mut buf);

        assert_eq!(buf, INTERVAL);
    }

    #[test]
    fn test_interval_overflow() {
        let interval = NzInterval {
            microseconds: i64::MAX,
            ..NzInterval::default()
        };

        assert!(interval.to_month_day_nano().is_err());
        assert!(NzInterval::decode(&INTERVAL[..12]).unwrap_err().is_malformed());
    }
}
