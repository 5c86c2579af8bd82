//! Min-max intensity normalization.
//!
//! Rescales an array linearly into `[0, max_val]`. When no maximum is
//! given, the maximum representable value of the array's integer element
//! type is used. A constant array has no range; its normalized values are
//! NaN and a warning is logged.

use std::fmt;
use std::str::FromStr;

use ndarray::{Array, ArrayBase, Data, Dimension};
use serde::{Deserialize, Serialize};

use crate::error::{CoreError, Result};

/// Numeric representation of array elements.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScalarKind {
    U8,
    I8,
    U16,
    I16,
    U32,
    I32,
    U64,
    I64,
    F32,
    F64,
}

impl ScalarKind {
    /// Largest representable value for integer kinds, `None` for floats.
    pub fn integer_max(self) -> Option<f64> {
        match self {
            Self::U8 => Some(u8::MAX as f64),
            Self::I8 => Some(i8::MAX as f64),
            Self::U16 => Some(u16::MAX as f64),
            Self::I16 => Some(i16::MAX as f64),
            Self::U32 => Some(u32::MAX as f64),
            Self::I32 => Some(i32::MAX as f64),
            Self::U64 => Some(u64::MAX as f64),
            Self::I64 => Some(i64::MAX as f64),
            Self::F32 | Self::F64 => None,
        }
    }

    pub fn is_integer(self) -> bool {
        self.integer_max().is_some()
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::U8 => "uint8",
            Self::I8 => "int8",
            Self::U16 => "uint16",
            Self::I16 => "int16",
            Self::U32 => "uint32",
            Self::I32 => "int32",
            Self::U64 => "uint64",
            Self::I64 => "int64",
            Self::F32 => "float32",
            Self::F64 => "float64",
        }
    }
}

impl fmt::Display for ScalarKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for ScalarKind {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self> {
        let kind = match s.trim().to_ascii_lowercase().as_str() {
            "uint8" | "u8" => Self::U8,
            "int8" | "i8" => Self::I8,
            "uint16" | "u16" => Self::U16,
            "int16" | "i16" => Self::I16,
            "uint32" | "u32" => Self::U32,
            "int32" | "i32" => Self::I32,
            "uint64" | "u64" => Self::U64,
            "int64" | "i64" => Self::I64,
            "float32" | "f32" | "float" => Self::F32,
            "float64" | "f64" | "double" => Self::F64,
            _ => return Err(CoreError::UnknownScalarKind(s.to_string())),
        };
        Ok(kind)
    }
}

/// Element types the normalizer accepts and produces.
pub trait Scalar: Copy + 'static {
    const KIND: ScalarKind;

    fn to_f64(self) -> f64;

    /// Convert with Rust `as` semantics: integers truncate toward zero and
    /// saturate at their bounds, NaN becomes zero.
    fn from_f64_truncating(value: f64) -> Self;
}

macro_rules! impl_scalar {
    ($($t:ty => $kind:ident),* $(,)?) => {
        $(
            impl Scalar for $t {
                const KIND: ScalarKind = ScalarKind::$kind;

                #[inline]
                fn to_f64(self) -> f64 {
                    self as f64
                }

                #[inline]
                fn from_f64_truncating(value: f64) -> Self {
                    value as $t
                }
            }
        )*
    };
}

impl_scalar!(
    u8 => U8, i8 => I8, u16 => U16, i16 => I16,
    u32 => U32, i32 => I32, u64 => U64, i64 => I64,
    f32 => F32, f64 => F64,
);

/// Normalize `img` into `[0, max_val]` as `f64`.
///
/// With `max_val` of `None` the maximum of `T` is used, which fails with
/// [`CoreError::NonIntegerKind`] for floating point elements.
pub fn min_max_norm<T, S, D>(img: &ArrayBase<S, D>, max_val: Option<f64>) -> Result<Array<f64, D>>
where
    T: Scalar,
    S: Data<Elem = T>,
    D: Dimension,
{
    min_max_norm_values(img.mapv(T::to_f64), T::KIND, max_val)
}

/// [`min_max_norm`] followed by a truncating cast to `U`.
pub fn min_max_norm_as<T, U, S, D>(img: &ArrayBase<S, D>, max_val: Option<f64>) -> Result<Array<U, D>>
where
    T: Scalar,
    U: Scalar,
    S: Data<Elem = T>,
    D: Dimension,
{
    let normalized = min_max_norm(img, max_val)?;
    Ok(cast_truncating(&normalized))
}

/// Normalize values already widened to `f64`, with `native` the element
/// kind they were read as.
pub fn min_max_norm_values<D: Dimension>(
    values: Array<f64, D>,
    native: ScalarKind,
    max_val: Option<f64>,
) -> Result<Array<f64, D>> {
    let max_val = match max_val {
        Some(v) => v,
        None => native.integer_max().ok_or(CoreError::NonIntegerKind(native))?,
    };

    if values.is_empty() {
        return Err(CoreError::EmptyArray);
    }
    let (lo, hi) = value_range(values.iter().copied());
    if hi == lo {
        tracing::warn!("constant intensity {} has no range, normalized values are not finite", lo);
    }
    let range = hi - lo;

    Ok(values.mapv_into(|v| (v - lo) / range * max_val))
}

pub fn cast_truncating<U: Scalar, S, D>(values: &ArrayBase<S, D>) -> Array<U, D>
where
    S: Data<Elem = f64>,
    D: Dimension,
{
    values.mapv(U::from_f64_truncating)
}

// A single NaN element makes both bounds NaN.
fn value_range(values: impl Iterator<Item = f64>) -> (f64, f64) {
    values.fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| {
        if v.is_nan() || lo.is_nan() {
            (f64::NAN, f64::NAN)
        } else {
            (lo.min(v), hi.max(v))
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::{arr1, arr2};

    #[test]
    fn test_default_max_from_integer_kind() {
        let img = arr1(&[10u8, 20, 30]);
        let out = min_max_norm(&img, None).unwrap();
        assert_eq!(out, arr1(&[0.0, 127.5, 255.0]));
    }

    #[test]
    fn test_explicit_max() {
        let img = arr2(&[[0.5f32, 1.5], [2.5, 4.5]]);
        let out = min_max_norm(&img, Some(1.0)).unwrap();
        assert_eq!(out, arr2(&[[0.0, 0.25], [0.5, 1.0]]));
    }

    #[test]
    fn test_float_without_max_fails() {
        let img = arr1(&[0.0f64, 1.0]);
        let err = min_max_norm(&img, None).unwrap_err();
        assert!(matches!(err, CoreError::NonIntegerKind(ScalarKind::F64)));
    }

    #[test]
    fn test_cast_truncates() {
        let img = arr1(&[0i16, 1, 2]);
        let out: Array<u8, _> = min_max_norm_as::<i16, u8, _, _>(&img, Some(3.0)).unwrap();
        // 0.0, 1.5, 3.0
        assert_eq!(out, arr1(&[0u8, 1, 3]));
    }

    #[test]
    fn test_constant_array_is_not_finite() {
        let img = arr1(&[7u16, 7, 7]);
        let out = min_max_norm(&img, None).unwrap();
        assert!(out.iter().all(|v| !v.is_finite()));
    }

    #[test]
    fn test_nan_element_poisons_whole_array() {
        let img = arr1(&[0.0f64, f64::NAN, 2.0]);
        let out = min_max_norm(&img, Some(1.0)).unwrap();
        assert!(out.iter().all(|v| v.is_nan()));
    }

    #[test]
    fn test_all_nan_array_is_not_empty() {
        let img = arr1(&[f64::NAN, f64::NAN]);
        let out = min_max_norm(&img, Some(1.0)).unwrap();
        assert_eq!(out.len(), 2);
        assert!(out.iter().all(|v| v.is_nan()));
    }

    #[test]
    fn test_scalar_kind_serde_names() {
        let json = serde_json::to_string(&ScalarKind::U16).unwrap();
        assert_eq!(json, "\"u16\"");
        let kind: ScalarKind = serde_json::from_str("\"f32\"").unwrap();
        assert_eq!(kind, ScalarKind::F32);
    }

    #[test]
    fn test_empty_array() {
        let img = Array::<u8, _>::zeros(0);
        assert!(matches!(min_max_norm(&img, None), Err(CoreError::EmptyArray)));
    }

    #[test]
    fn test_scalar_kind_from_str() {
        assert_eq!("uint16".parse::<ScalarKind>().unwrap(), ScalarKind::U16);
        assert_eq!("f32".parse::<ScalarKind>().unwrap(), ScalarKind::F32);
        assert_eq!("Float64".parse::<ScalarKind>().unwrap(), ScalarKind::F64);
        assert!("complex64".parse::<ScalarKind>().is_err());
    }
}
