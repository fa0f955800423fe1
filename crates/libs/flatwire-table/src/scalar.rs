//! Little-endian scalar encoding for table fields.

/// A fixed-size value stored inline in a table or at a vector element.
///
/// Every scalar is aligned to its own size inside the buffer.
pub trait Scalar: Copy + PartialEq + core::fmt::Debug {
    /// Encoded width in bytes.
    const SIZE: usize;

    /// Write `self` into `dst`, which is exactly `SIZE` bytes long.
    fn write_le(self, dst: &mut [u8]);

    /// Read a value from `src`, which is exactly `SIZE` bytes long.
    fn read_le(src: &[u8]) -> Self;
}

macro_rules! impl_scalar {
    ($($ty:ty),* $(,)?) => {
        $(
            impl Scalar for $ty {
                const SIZE: usize = core::mem::size_of::<$ty>();

                #[inline]
                fn write_le(self, dst: &mut [u8]) {
                    dst.copy_from_slice(&self.to_le_bytes());
                }

                #[inline]
                fn read_le(src: &[u8]) -> Self {
                    let mut raw = [0u8; core::mem::size_of::<$ty>()];
                    raw.copy_from_slice(src);
                    <$ty>::from_le_bytes(raw)
                }
            }
        )*
    };
}

impl_scalar!(u8, i8, u16, i16, u32, i32, u64, i64, f32, f64);

impl Scalar for bool {
    const SIZE: usize = 1;

    #[inline]
    fn write_le(self, dst: &mut [u8]) {
        dst[0] = u8::from(self);
    }

    #[inline]
    fn read_le(src: &[u8]) -> Self {
        src[0] != 0
    }
}
