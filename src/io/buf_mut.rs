use bytes::BufMut;

use crate::error::Result;
use crate::io::WireNative;

/// Length of a field whose value is null.
pub const NULL_FIELD: i32 = -1;

pub trait NzBufMutExt {
    fn put_field_prefixed<F>(&mut self, f: F) -> Result<()>
    where
        F: FnOnce(&mut Vec<u8>) -> Result<()>;

    fn put_null_field(&mut self);

    fn put_fixed_field<T: WireNative>(&mut self, value: T);

    fn put_bytes_field(&mut self, value: &[u8]) -> Result<()>;
}

impl NzBufMutExt for Vec<u8> {
    // writes a field preceded by its length; unlike protocol messages the length
    // does not count the 4 bytes of the length itself
    fn put_field_prefixed<F>(&mut self, write_contents: F) -> Result<()>
    where
        F: FnOnce(&mut Vec<u8>) -> Result<()>,
    {
        // reserve space to write the prefixed length
        let offset = self.len();
        self.extend(&[0; 4]);

        let write_result = write_contents(self);

        let size_result = write_result.and_then(|_| {
            let size = self.len() - offset - 4;
            i32::try_from(size).map_err(|_| {
                crate::Error::Encode(format!("field size out of range for COPY: {size}"))
            })
        });

        match size_result {
            Ok(size) => {
                self[offset..(offset + 4)].copy_from_slice(&size.to_be_bytes());
                Ok(())
            }
            Err(e) => {
                // Put the buffer back to where it was.
                self.truncate(offset);
                Err(e)
            }
        }
    }

    #[inline]
    fn put_null_field(&mut self) {
        self.put_i32(NULL_FIELD);
    }

    #[inline]
    fn put_fixed_field<T: WireNative>(&mut self, value: T) {
        // SIZE is at most 8
        #[allow(clippy::cast_possible_truncation, clippy::cast_possible_wrap)]
        self.put_i32(T::SIZE as i32);
        value.put(self);
    }

    fn put_bytes_field(&mut self, value: &[u8]) -> Result<()> {
        self.put_field_prefixed(|buf| {
            buf.extend_from_slice(value);
            Ok(())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::NzBufMutExt;
    use crate::Error;

    #[test]
    fn test_put_field_prefixed() -> crate::Result<()> {
        let mut buf = vec![0xaa];

        buf.put_field_prefixed(|buf| {
            buf.extend_from_slice(b"abc");
            Ok(())
        })?;

        assert_eq!(buf, [0xaa, 0, 0, 0, 3, b'a', b'b', b'c']);

        Ok(())
    }

    #[test]
    fn test_put_field_prefixed_restores_on_error() {
        let mut buf = vec![0xaa];

        let res = buf.put_field_prefixed(|buf| {
            buf.extend_from_slice(b"partial");
            Err(Error::Encode("nope".into()))
        });

        assert!(res.is_err());
        assert_eq!(buf, [0xaa]);
    }

    #[test]
    fn test_put_fixed_and_null() {
        let mut buf = Vec::new();

        buf.put_fixed_field(7_i16);
        buf.put_null_field();

        assert_eq!(buf, [0, 0, 0, 2, 0, 7, 0xff, 0xff, 0xff, 0xff]);
    }
}
