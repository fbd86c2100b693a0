//! # Float Values
//!
//! Values are stored as raw little-endian bytes. Arithmetic decodes them into
//! lanes of the result type's float width, computes in that precision and
//! encodes the lanes back.

use std::ops::{Add, Div, Mul, Neg, Sub};

/// Float lane type the VM computes with
pub trait Float:
    Copy
    + PartialOrd
    + std::fmt::Debug
    + Add<Output = Self>
    + Sub<Output = Self>
    + Mul<Output = Self>
    + Div<Output = Self>
    + Neg<Output = Self>
{
    const BYTES: usize;
    const ZERO: Self;
    const ONE: Self;

    fn read(bytes: &[u8]) -> Self;
    fn write(self, out: &mut Vec<u8>);

    fn abs(self) -> Self;
    fn floor(self) -> Self;
    fn ceil(self) -> Self;
    fn sqrt(self) -> Self;
    fn powf(self, exponent: Self) -> Self;
}

macro_rules! impl_float {
    ($t:ty, $bytes:literal) => {
        impl Float for $t {
            const BYTES: usize = $bytes;
            const ZERO: Self = 0.0;
            const ONE: Self = 1.0;

            #[inline]
            fn read(bytes: &[u8]) -> Self {
                let mut buf = [0u8; $bytes];
                buf.copy_from_slice(&bytes[..$bytes]);
                <$t>::from_le_bytes(buf)
            }

            #[inline]
            fn write(self, out: &mut Vec<u8>) {
                out.extend_from_slice(&self.to_le_bytes());
            }

            #[inline]
            fn abs(self) -> Self {
                <$t>::abs(self)
            }

            #[inline]
            fn floor(self) -> Self {
                <$t>::floor(self)
            }

            #[inline]
            fn ceil(self) -> Self {
                <$t>::ceil(self)
            }

            #[inline]
            fn sqrt(self) -> Self {
                <$t>::sqrt(self)
            }

            #[inline]
            fn powf(self, exponent: Self) -> Self {
                <$t>::powf(self, exponent)
            }
        }
    };
}

impl_float!(f32, 4);
impl_float!(f64, 8);

/// Run `$body` with `$t` bound to the float type of `$width` bits
///
/// Widths other than 32 and 64 return `UnsupportedFloatWidth` for `$id`.
macro_rules! by_width {
    ($width:expr, $id:expr, |$t:ident| $body:expr) => {
        match $width {
            32 => {
                type $t = f32;
                $body
            }
            64 => {
                type $t = f64;
                $body
            }
            width => {
                return Err($crate::error::RuntimeError::UnsupportedFloatWidth { id: $id, width })
            }
        }
    };
}
pub(crate) use by_width;

/// Decode every whole lane in `bytes`
pub fn decode<T: Float>(bytes: &[u8]) -> Vec<T> {
    bytes.chunks_exact(T::BYTES).map(T::read).collect()
}

pub fn encode<T: Float>(lanes: &[T]) -> Box<[u8]> {
    let mut out = Vec::with_capacity(lanes.len() * T::BYTES);
    for &lane in lanes {
        lane.write(&mut out);
    }
    out.into_boxed_slice()
}

/// Check that `bytes` holds a whole number of `T` lanes
pub fn lane_count<T: Float>(bytes: &[u8]) -> Option<usize> {
    (bytes.len() % T::BYTES == 0).then_some(bytes.len() / T::BYTES)
}

/// Exactly one lane
pub fn scalar<T: Float>(bytes: &[u8]) -> Option<T> {
    (bytes.len() == T::BYTES).then(|| T::read(bytes))
}

/// Apply `f` to every lane
pub fn map1<T: Float>(a: &[u8], f: impl Fn(T) -> T) -> Option<Box<[u8]>> {
    lane_count::<T>(a)?;
    let lanes: Vec<T> = decode::<T>(a).into_iter().map(f).collect();
    Some(encode(&lanes))
}

/// Apply `f` lane by lane to two operands of the same shape
pub fn map2<T: Float>(a: &[u8], b: &[u8], f: impl Fn(T, T) -> T) -> Option<Box<[u8]>> {
    if a.len() != b.len() {
        return None;
    }
    lane_count::<T>(a)?;
    let lanes: Vec<T> = decode::<T>(a)
        .into_iter()
        .zip(decode::<T>(b))
        .map(|(x, y)| f(x, y))
        .collect();
    Some(encode(&lanes))
}

/// Apply `f` lane by lane to three operands of the same shape
pub fn map3<T: Float>(
    a: &[u8],
    b: &[u8],
    c: &[u8],
    f: impl Fn(T, T, T) -> T,
) -> Option<Box<[u8]>> {
    if a.len() != b.len() || a.len() != c.len() {
        return None;
    }
    lane_count::<T>(a)?;
    let (b, c) = (decode::<T>(b), decode::<T>(c));
    let lanes: Vec<T> = decode::<T>(a)
        .into_iter()
        .enumerate()
        .map(|(i, x)| f(x, b[i], c[i]))
        .collect();
    Some(encode(&lanes))
}

/// GLSL `min`: `y < x ? y : x`
#[inline]
pub fn fmin<T: Float>(x: T, y: T) -> T {
    if y < x {
        y
    } else {
        x
    }
}

/// GLSL `max`: `x < y ? y : x`
#[inline]
pub fn fmax<T: Float>(x: T, y: T) -> T {
    if x < y {
        y
    } else {
        x
    }
}

/// `min(max(x, lo), hi)`
#[inline]
pub fn fclamp<T: Float>(x: T, lo: T, hi: T) -> T {
    fmin(fmax(x, lo), hi)
}

pub fn dot<T: Float>(a: &[T], b: &[T]) -> T {
    a.iter().zip(b).fold(T::ZERO, |acc, (&x, &y)| acc + x * y)
}

pub fn length<T: Float>(v: &[T]) -> T {
    dot(v, v).sqrt()
}

/// Float lanes to bytes, as bound to input locations
pub fn f32_bytes(values: &[f32]) -> Vec<u8> {
    encode(values).into_vec()
}

/// Bytes to float lanes; a trailing partial lane is ignored
pub fn bytes_f32(bytes: &[u8]) -> Vec<f32> {
    decode(bytes)
}
