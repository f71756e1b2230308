use bytes::{Buf, BufMut};

use crate::error::{Error, Result};

/// A fixed-width value with a network-endian representation on the wire.
pub trait WireNative: Copy + Sized {
    const SIZE: usize;

    /// Reads the value, assuming at least [`Self::SIZE`] bytes remain.
    fn get(buf: &mut &[u8]) -> Self;

    fn put(self, buf: &mut Vec<u8>);
}

macro_rules! impl_wire_native {
    ($($ty:ty => $get:ident, $put:ident;)*) => {
        $(
            impl WireNative for $ty {
                const SIZE: usize = std::mem::size_of::<$ty>();

                #[inline]
                fn get(buf: &mut &[u8]) -> Self {
                    buf.$get()
                }

                #[inline]
                fn put(self, buf: &mut Vec<u8>) {
                    buf.$put(self);
                }
            }
        )*
    };
}

impl_wire_native! {
    i8 => get_i8, put_i8;
    i16 => get_i16, put_i16;
    u16 => get_u16, put_u16;
    i32 => get_i32, put_i32;
    u32 => get_u32, put_u32;
    i64 => get_i64, put_i64;
    f32 => get_f32, put_f32;
    f64 => get_f64, put_f64;
}

/// Bounds-checked reads over a cursor into COPY data.
///
/// A short buffer is reported as [`Error::UnexpectedEof`] and leaves the cursor untouched.
pub trait NzBufExt<'a> {
    fn get_checked<T: WireNative>(&mut self) -> Result<T>;

    fn split_bytes(&mut self, n: usize) -> Result<&'a [u8]>;
}

impl<'a> NzBufExt<'a> for &'a [u8] {
    #[inline]
    fn get_checked<T: WireNative>(&mut self) -> Result<T> {
        ensure_remaining(self, T::SIZE)?;

        Ok(T::get(self))
    }

    #[inline]
    fn split_bytes(&mut self, n: usize) -> Result<&'a [u8]> {
        ensure_remaining(self, n)?;

        let (head, tail) = self.split_at(n);
        *self = tail;

        Ok(head)
    }
}

#[inline]
fn ensure_remaining(buf: &[u8], expected: usize) -> Result<()> {
    if buf.len() < expected {
        return Err(Error::UnexpectedEof {
            expected,
            remaining: buf.len(),
        });
    }

    Ok(())
}
