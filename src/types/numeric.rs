use std::fmt::{self, Display, Formatter};
use std::str::FromStr;

use bytes::BufMut;

use crate::error::{Error, Result};
use crate::io::NzBufExt;

const SIGN_POSITIVE: u16 = 0x0000;
const SIGN_NEGATIVE: u16 = 0x4000;
const SIGN_NAN: u16 = 0xC000;
const SIGN_POSITIVE_INFINITY: u16 = 0xD000;
const SIGN_NEGATIVE_INFINITY: u16 = 0xF000;

/// Decimal digits held by one base-10000 digit.
const DEC_DIGITS: usize = 4;

const HEADER_SIZE: usize = 8;

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum NzNumericSign {
    Positive,
    Negative,
}

/// The binary representation of a `NUMERIC` value.
///
/// Finite values are a list of base-10000 digits, most significant first. `weight` is
/// the power of 10000 of the first digit and `scale` the number of decimal digits shown
/// after the point.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NzNumeric {
    Number {
        sign: NzNumericSign,
        weight: i16,
        scale: u16,
        digits: Vec<i16>,
    },
    NotANumber,
    Infinity,
    NegativeInfinity,
}

impl NzNumeric {
    pub const ZERO: NzNumeric = NzNumeric::Number {
        sign: NzNumericSign::Positive,
        weight: 0,
        scale: 0,
        digits: Vec::new(),
    };

    /// Decodes the complete value of a `NUMERIC` field.
    ///
    /// `field` must hold exactly the header and the digits it announces.
    pub fn decode(mut field: &[u8]) -> Result<Self> {
        let size = field.len();

        if size < HEADER_SIZE {
            return Err(err_malformed!(
                "expected at least {} bytes of numeric data but found {}",
                HEADER_SIZE,
                size
            ));
        }

        let ndigits = field.get_checked::<i16>()?;
        let weight = field.get_checked::<i16>()?;
        let sign = field.get_checked::<u16>()?;
        let scale = field.get_checked::<u16>()?;

        let ndigits = usize::try_from(ndigits)
            .map_err(|_| err_malformed!("negative numeric digit count: {}", ndigits))?;

        if field.len() != ndigits * 2 {
            return Err(err_malformed!(
                "expected {} bytes of numeric digits but found {}",
                ndigits * 2,
                field.len()
            ));
        }

        let sign = match sign {
            SIGN_POSITIVE => NzNumericSign::Positive,
            SIGN_NEGATIVE => NzNumericSign::Negative,

            // digits of special values carry no meaning
            SIGN_NAN => return Ok(NzNumeric::NotANumber),
            SIGN_POSITIVE_INFINITY => return Ok(NzNumeric::Infinity),
            SIGN_NEGATIVE_INFINITY => return Ok(NzNumeric::NegativeInfinity),

            other => {
                return Err(err_malformed!(
                    "unexpected sign in numeric field: {:#06x}",
                    other
                ))
            }
        };

        let mut digits = Vec::with_capacity(ndigits);
        for _ in 0..ndigits {
            let digit = field.get_checked::<i16>()?;

            if !(0..10_000).contains(&digit) {
                return Err(err_malformed!("numeric digit out of range: {}", digit));
            }

            digits.push(digit);
        }

        Ok(NzNumeric::Number {
            sign,
            weight,
            scale,
            digits,
        })
    }

    /// Appends the binary representation (without the field length).
    pub fn encode(&self, buf: &mut Vec<u8>) -> Result<()> {
        let (sign, weight, scale, digits): (u16, i16, u16, &[i16]) = match self {
            NzNumeric::Number {
                sign,
                weight,
                scale,
                digits,
            } => {
                let sign = match sign {
                    NzNumericSign::Positive => SIGN_POSITIVE,
                    NzNumericSign::Negative => SIGN_NEGATIVE,
                };

                (sign, *weight, *scale, digits)
            }

            NzNumeric::NotANumber => (SIGN_NAN, 0, 0, &[]),
            NzNumeric::Infinity => (SIGN_POSITIVE_INFINITY, 0, 0, &[]),
            NzNumeric::NegativeInfinity => (SIGN_NEGATIVE_INFINITY, 0, 0, &[]),
        };

        let ndigits = i16::try_from(digits.len())
            .map_err(|_| Error::Encode(format!("too many numeric digits: {}", digits.len())))?;

        buf.put_i16(ndigits);
        buf.put_i16(weight);
        buf.put_u16(sign);
        buf.put_u16(scale);

        for digit in digits {
            buf.put_i16(*digit);
        }

        Ok(())
    }

    /// Converts an Arrow `Decimal128` value of the given scale.
    pub fn from_decimal128(value: i128, scale: i8) -> Result<Self> {
        let mut s = value.unsigned_abs().to_string();

        if scale <= 0 {
            s.extend(std::iter::repeat('0').take(usize::from(scale.unsigned_abs())));
        } else {
            let scale = usize::from(scale.unsigned_abs());

            if s.len() <= scale {
                s.insert_str(0, &"0".repeat(scale - s.len() + 1));
            }

            s.insert(s.len() - scale, '.');
        }

        if value < 0 {
            s.insert(0, '-');
        }

        s.parse()
    }

    pub fn is_special(&self) -> bool {
        !matches!(self, NzNumeric::Number { .. })
    }
}

/// Renders the value the way the server prints it: special values as `nan`, `inf` and
/// `-inf`, finite values with exactly `scale` digits after the point.
impl Display for NzNumeric {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let (sign, weight, scale, digits) = match self {
            NzNumeric::Number {
                sign,
                weight,
                scale,
                digits,
            } => (sign, i32::from(*weight), usize::from(*scale), digits),

            NzNumeric::NotANumber => return f.write_str("nan"),
            NzNumeric::Infinity => return f.write_str("inf"),
            NzNumeric::NegativeInfinity => return f.write_str("-inf"),
        };

        let digit_at = |d: i32| -> i16 {
            usize::try_from(d)
                .ok()
                .and_then(|d| digits.get(d))
                .copied()
                .unwrap_or(0)
        };

        let mut out = String::with_capacity(
            (usize::try_from(weight + 1).unwrap_or(1) * DEC_DIGITS).max(1) + scale + DEC_DIGITS + 2,
        );

        if *sign == NzNumericSign::Negative {
            out.push('-');
        }

        // digits before the decimal point
        let mut d;
        if weight < 0 {
            d = weight + 1;
            out.push('0');
        } else {
            d = 0;
            while d <= weight {
                let mut dig = digit_at(d);

                // leading zeroes of the first digit are dropped, its ones place never is
                let mut putit = d > 0;
                for pow10 in [1000, 100, 10, 1] {
                    let d1 = dig / pow10;
                    dig -= d1 * pow10;
                    putit |= d1 > 0 || pow10 == 1;

                    if putit {
                        out.push(decimal_char(d1));
                    }
                }

                d += 1;
            }
        }

        // digits after the decimal point, rendered a whole base-10000 digit at a time
        // and cut back to `scale`
        if scale > 0 {
            let point = out.len();
            out.push('.');

            while out.len() - point - 1 < scale {
                let dig = digit_at(d);

                for pow10 in [1000, 100, 10, 1] {
                    out.push(decimal_char((dig / pow10) % 10));
                }

                d += 1;
            }

            out.truncate(point + 1 + scale);
        }

        f.write_str(&out)
    }
}

fn decimal_char(d: i16) -> char {
    char::from_digit(u32::from(d.unsigned_abs()), 10).unwrap_or('0')
}

impl FromStr for NzNumeric {
    type Err = Error;

    /// Parses plain decimal notation (`-12.340`) and the special values `nan`, `inf`,
    /// `infinity`, `-inf` and `-infinity`, ignoring ASCII case.
    fn from_str(s: &str) -> Result<Self> {
        let invalid = || Error::Encode(format!("invalid numeric value: {s:?}"));

        let trimmed = s.trim();

        if trimmed.eq_ignore_ascii_case("nan") {
            return Ok(NzNumeric::NotANumber);
        }

        let (negative, unsigned) = match trimmed.as_bytes().first() {
            Some(b'-') => (true, &trimmed[1..]),
            Some(b'+') => (false, &trimmed[1..]),
            _ => (false, trimmed),
        };

        if unsigned.eq_ignore_ascii_case("inf") || unsigned.eq_ignore_ascii_case("infinity") {
            return Ok(if negative {
                NzNumeric::NegativeInfinity
            } else {
                NzNumeric::Infinity
            });
        }

        let (int_part, frac_part) = match unsigned.split_once('.') {
            Some((int_part, frac_part)) => (int_part, frac_part),
            None => (unsigned, ""),
        };

        if int_part.is_empty() && frac_part.is_empty()
            || !int_part.bytes().all(|b| b.is_ascii_digit())
            || !frac_part.bytes().all(|b| b.is_ascii_digit())
        {
            return Err(invalid());
        }

        let scale = u16::try_from(frac_part.len()).map_err(|_| invalid())?;

        // left-pad the integer part and right-pad the fraction to whole base-10000 digits
        let int_pad = (DEC_DIGITS - int_part.len() % DEC_DIGITS) % DEC_DIGITS;
        let frac_pad = (DEC_DIGITS - frac_part.len() % DEC_DIGITS) % DEC_DIGITS;

        let mut decimal = Vec::with_capacity(int_pad + int_part.len() + frac_part.len() + frac_pad);
        decimal.extend(std::iter::repeat(0).take(int_pad));
        decimal.extend(int_part.bytes().map(|b| b - b'0'));
        decimal.extend(frac_part.bytes().map(|b| b - b'0'));
        decimal.extend(std::iter::repeat(0).take(frac_pad));

        let mut digits: Vec<i16> = decimal
            .chunks(DEC_DIGITS)
            .map(|chunk| chunk.iter().fold(0i16, |a, &d| a * 10 + i16::from(d)))
            .collect();

        let int_digits = (int_pad + int_part.len()) / DEC_DIGITS;
        let mut weight = i32::try_from(int_digits).map_err(|_| invalid())? - 1;

        let leading_zeros = digits.iter().take_while(|d| **d == 0).count();
        digits.drain(..leading_zeros);
        weight -= i32::try_from(leading_zeros).map_err(|_| invalid())?;

        while let Some(&0) = digits.last() {
            digits.pop();
        }

        if digits.is_empty() {
            weight = 0;
        }

        let weight = i16::try_from(weight).map_err(|_| invalid())?;

        Ok(NzNumeric::Number {
            sign: if negative && !digits.is_empty() {
                NzNumericSign::Negative
            } else {
                NzNumericSign::Positive
            },
            weight,
            scale,
            digits,
        })
    }
}
