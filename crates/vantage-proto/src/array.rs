// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Runtime-typed, shaped numeric buffers and their validation.
//!
//! A [`TypedArray`] arrives from the wire untrusted. Nothing here assumes the
//! tag, shape and byte length agree; every reader re-checks before touching
//! the bytes. Checks report an [`ArrayCheckError`] whose `Display` output is
//! the diagnostic that ends up in logs and error replies.

use std::fmt;

use thiserror::Error;
use vantage_scene_port::{IndexTriple, Vec3};

/// Maximum number of dimensions accepted from the wire.
pub const MAX_RANK: usize = 8;

/// Element types accepted for positions, normals and colors.
pub const FLOAT_TYPES: [ElementType; 2] = [ElementType::F32, ElementType::F64];

/// Element types accepted for triangle indices.
pub const INDEX_TYPES: [ElementType; 2] = [ElementType::I32, ElementType::I64];

/// Shape of a row-major table of 3-component records with any row count.
pub const ROWS_OF_THREE: [i64; 2] = [-1, 3];

/// Element type tag of a [`TypedArray`].
///
/// Wire tags follow the numpy array-interface spelling. Anything else is
/// kept verbatim in [`ElementType::Unknown`] and fails every type check.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum ElementType {
    /// 32-bit float (`<f4`).
    F32,
    /// 64-bit float (`<f8`).
    F64,
    /// 8-bit signed integer (`|i1`).
    I8,
    /// 16-bit signed integer (`<i2`).
    I16,
    /// 32-bit signed integer (`<i4`).
    I32,
    /// 64-bit signed integer (`<i8`).
    I64,
    /// 8-bit unsigned integer (`|u1`).
    U8,
    /// 16-bit unsigned integer (`<u2`).
    U16,
    /// 32-bit unsigned integer (`<u4`).
    U32,
    /// 64-bit unsigned integer (`<u8`).
    U64,
    /// Unrecognized wire tag (empty when the field was missing).
    Unknown(String),
}

impl ElementType {
    /// Parse a wire tag.
    pub fn from_tag(tag: &str) -> Self {
        match tag {
            "<f4" => Self::F32,
            "<f8" => Self::F64,
            "|i1" => Self::I8,
            "<i2" => Self::I16,
            "<i4" => Self::I32,
            "<i8" => Self::I64,
            "|u1" => Self::U8,
            "<u2" => Self::U16,
            "<u4" => Self::U32,
            "<u8" => Self::U64,
            other => Self::Unknown(other.to_owned()),
        }
    }

    /// Wire tag for this type.
    pub fn tag(&self) -> &str {
        match self {
            Self::F32 => "<f4",
            Self::F64 => "<f8",
            Self::I8 => "|i1",
            Self::I16 => "<i2",
            Self::I32 => "<i4",
            Self::I64 => "<i8",
            Self::U8 => "|u1",
            Self::U16 => "<u2",
            Self::U32 => "<u4",
            Self::U64 => "<u8",
            Self::Unknown(tag) => tag,
        }
    }

    /// Size of one element in bytes; `None` for unknown tags.
    pub fn size(&self) -> Option<usize> {
        match self {
            Self::I8 | Self::U8 => Some(1),
            Self::I16 | Self::U16 => Some(2),
            Self::F32 | Self::I32 | Self::U32 => Some(4),
            Self::F64 | Self::I64 | Self::U64 => Some(8),
            Self::Unknown(_) => None,
        }
    }
}

impl fmt::Display for ElementType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unknown(tag) if tag.is_empty() => f.write_str("(none)"),
            other => f.write_str(other.tag()),
        }
    }
}

/// Validation failure for a [`TypedArray`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ArrayCheckError {
    /// Element type not in the allowed set.
    #[error("expected type one of {expected} but got {actual}")]
    Type {
        /// Allowed tags, formatted as a list.
        expected: String,
        /// Tag actually present.
        actual: String,
    },
    /// Rank or a fixed dimension differs from the expectation.
    #[error("expected shape {expected:?} but got {actual:?}")]
    Shape {
        /// Expected shape (`-1` = any size).
        expected: Vec<i64>,
        /// Shape actually present.
        actual: Vec<i64>,
    },
    /// Negative, overflowing or too many dimensions.
    #[error("invalid shape {shape:?}")]
    InvalidShape {
        /// Offending shape.
        shape: Vec<i64>,
    },
    /// The element type has no known size, so the buffer cannot be read.
    #[error("element type {0} has no known size")]
    UnsizedType(String),
    /// Byte length does not match shape times element size.
    #[error("expected {expected} data bytes but got {actual}")]
    DataLength {
        /// Bytes implied by shape and type.
        expected: usize,
        /// Bytes actually present.
        actual: usize,
    },
    /// A check failed on a named message field.
    #[error("invalid {field} array: {source}")]
    Field {
        /// Field name as it appears on the wire.
        field: &'static str,
        /// Underlying failure.
        #[source]
        source: Box<ArrayCheckError>,
    },
}

impl ArrayCheckError {
    /// Attach the wire field name to this error.
    pub fn in_field(self, field: &'static str) -> Self {
        Self::Field {
            field,
            source: Box::new(self),
        }
    }
}

fn format_types(types: &[ElementType]) -> String {
    let tags: Vec<String> = types.iter().map(ToString::to_string).collect();
    format!("[{}]", tags.join(", "))
}

/// Shaped numeric buffer as received on the wire.
///
/// An array with an empty shape is *absent*: the producer omitted the field.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TypedArray {
    /// Element type tag.
    pub dtype: ElementType,
    /// Dimension sizes, outermost first.
    pub shape: Vec<i64>,
    /// Little-endian element bytes, row-major.
    pub data: Vec<u8>,
}

impl Default for TypedArray {
    fn default() -> Self {
        Self {
            dtype: ElementType::Unknown(String::new()),
            shape: Vec::new(),
            data: Vec::new(),
        }
    }
}

impl TypedArray {
    /// Create an array from raw parts. No validation happens here.
    pub fn new(dtype: ElementType, shape: Vec<i64>, data: Vec<u8>) -> Self {
        Self { dtype, shape, data }
    }

    /// Build an `[N, 3]` float32 array.
    pub fn from_f32_rows(rows: &[[f32; 3]]) -> Self {
        let data = rows.iter().flatten().flat_map(|v| v.to_le_bytes()).collect();
        Self::new(ElementType::F32, rows_of_three(rows.len()), data)
    }

    /// Build an `[N, 3]` float64 array.
    pub fn from_f64_rows(rows: &[[f64; 3]]) -> Self {
        let data = rows.iter().flatten().flat_map(|v| v.to_le_bytes()).collect();
        Self::new(ElementType::F64, rows_of_three(rows.len()), data)
    }

    /// Build an `[N, 3]` int32 array.
    pub fn from_i32_rows(rows: &[[i32; 3]]) -> Self {
        let data = rows.iter().flatten().flat_map(|v| v.to_le_bytes()).collect();
        Self::new(ElementType::I32, rows_of_three(rows.len()), data)
    }

    /// Build an `[N, 3]` int64 array.
    pub fn from_i64_rows(rows: &[[i64; 3]]) -> Self {
        let data = rows.iter().flatten().flat_map(|v| v.to_le_bytes()).collect();
        Self::new(ElementType::I64, rows_of_three(rows.len()), data)
    }

    /// True when the field was omitted (empty shape).
    pub fn is_absent(&self) -> bool {
        self.shape.is_empty()
    }

    /// Number of elements implied by the shape.
    pub fn element_count(&self) -> Result<usize, ArrayCheckError> {
        if self.shape.len() > MAX_RANK {
            return Err(self.invalid_shape());
        }
        self.shape.iter().try_fold(1usize, |acc, &dim| {
            usize::try_from(dim)
                .ok()
                .and_then(|dim| acc.checked_mul(dim))
                .ok_or_else(|| self.invalid_shape())
        })
    }

    /// Fails unless the element type is one of `allowed`.
    pub fn check_type(&self, allowed: &[ElementType]) -> Result<(), ArrayCheckError> {
        if allowed.contains(&self.dtype) {
            return Ok(());
        }
        Err(ArrayCheckError::Type {
            expected: format_types(allowed),
            actual: self.dtype.to_string(),
        })
    }

    /// Fails unless the rank matches and every non-wildcard (`-1`) dimension
    /// equals the expected size.
    pub fn check_shape(&self, expected: &[i64]) -> Result<(), ArrayCheckError> {
        let matches = self.shape.len() == expected.len()
            && self
                .shape
                .iter()
                .zip(expected)
                .all(|(&actual, &want)| want == -1 || actual == want);
        if matches {
            return Ok(());
        }
        Err(ArrayCheckError::Shape {
            expected: expected.to_vec(),
            actual: self.shape.clone(),
        })
    }

    /// True iff the array has at least one dimension and at least one element.
    pub fn check_non_empty(&self) -> bool {
        !self.shape.is_empty() && self.element_count().is_ok_and(|count| count > 0)
    }

    /// Fails unless the byte length equals element count times element size.
    pub fn check_data_len(&self) -> Result<(), ArrayCheckError> {
        let size = self
            .dtype
            .size()
            .ok_or_else(|| ArrayCheckError::UnsizedType(self.dtype.to_string()))?;
        let expected = self
            .element_count()?
            .checked_mul(size)
            .ok_or_else(|| self.invalid_shape())?;
        if expected != self.data.len() {
            return Err(ArrayCheckError::DataLength {
                expected,
                actual: self.data.len(),
            });
        }
        Ok(())
    }

    /// Read an `[N, 3]` float32/float64 array as N records, upcast to f64.
    pub fn read_vec3_rows(&self) -> Result<Vec<Vec3>, ArrayCheckError> {
        self.check_type(&FLOAT_TYPES)?;
        self.check_shape(&ROWS_OF_THREE)?;
        self.check_data_len()?;
        Ok(match self.dtype {
            ElementType::F32 => read_rows(&self.data, |raw: [u8; 4]| {
                f64::from(f32::from_le_bytes(raw))
            }),
            _ => read_rows(&self.data, f64::from_le_bytes),
        })
    }

    /// Read an `[N, 3]` int32/int64 array as N index triples.
    pub fn read_index_rows(&self) -> Result<Vec<IndexTriple>, ArrayCheckError> {
        self.check_shape(&ROWS_OF_THREE)?;
        self.check_type(&INDEX_TYPES)?;
        self.check_data_len()?;
        Ok(match self.dtype {
            ElementType::I32 => read_rows(&self.data, |raw: [u8; 4]| {
                i64::from(i32::from_le_bytes(raw))
            }),
            _ => read_rows(&self.data, i64::from_le_bytes),
        })
    }

    fn invalid_shape(&self) -> ArrayCheckError {
        ArrayCheckError::InvalidShape {
            shape: self.shape.clone(),
        }
    }
}

fn rows_of_three(rows: usize) -> Vec<i64> {
    vec![i64::try_from(rows).unwrap_or(i64::MAX), 3]
}

// Caller has already checked that `data` holds a whole number of rows.
fn read_rows<T, const W: usize>(data: &[u8], convert: impl Fn([u8; W]) -> T) -> Vec<[T; 3]>
where
    T: Copy + Default,
{
    data.chunks_exact(3 * W)
        .map(|row| {
            let mut out = [T::default(); 3];
            for (slot, chunk) in out.iter_mut().zip(row.chunks_exact(W)) {
                let mut raw = [0u8; W];
                raw.copy_from_slice(chunk);
                *slot = convert(raw);
            }
            out
        })
        .collect()
}
