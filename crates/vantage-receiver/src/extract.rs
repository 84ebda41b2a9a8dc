// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Degrade-and-log readers for the arrays of a geometry message.
//!
//! Each reader validates one array in a fixed order and reports the first
//! failed check as a [`FieldError`]. The `extract_*` wrappers turn that error
//! into an `info!` line and an empty result so the caller can keep going.

use std::fmt;

use thiserror::Error;
use tracing::info;
use vantage_proto::array::{FLOAT_TYPES, INDEX_TYPES, ROWS_OF_THREE};
use vantage_proto::{ArrayCheckError, GeometryMessage, TypedArray};
use vantage_scene_port::{IndexTriple, Vec3};

/// Which check rejected an optional field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Defect {
    /// Element type outside the allowed set.
    WrongType,
    /// Shape is not `[N, 3]`.
    WrongShape,
    /// Byte length disagrees with shape and element size.
    WrongSize,
}

impl fmt::Display for Defect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::WrongType => "wrong data type",
            Self::WrongShape => "wrong shape",
            Self::WrongSize => "wrong data size",
        })
    }
}

/// A rejected array: the failed check plus the validator diagnostic.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{defect}:{source}")]
pub struct FieldError {
    /// Failed check.
    pub defect: Defect,
    /// Validator diagnostic.
    pub source: ArrayCheckError,
}

impl FieldError {
    fn tag(defect: Defect) -> impl FnOnce(ArrayCheckError) -> Self {
        move |source| Self { defect, source }
    }
}

/// Validate and read an `[N, 3]` float array: type, then shape, then size.
pub fn read_vec3(array: &TypedArray) -> Result<Vec<Vec3>, FieldError> {
    array
        .check_type(&FLOAT_TYPES)
        .map_err(FieldError::tag(Defect::WrongType))?;
    array
        .check_shape(&ROWS_OF_THREE)
        .map_err(FieldError::tag(Defect::WrongShape))?;
    array
        .read_vec3_rows()
        .map_err(FieldError::tag(Defect::WrongSize))
}

/// Validate and read an `[M, 3]` index array: shape, then type, then size.
pub fn read_triangles(array: &TypedArray) -> Result<Vec<IndexTriple>, FieldError> {
    array
        .check_shape(&ROWS_OF_THREE)
        .map_err(FieldError::tag(Defect::WrongShape))?;
    array
        .check_type(&INDEX_TYPES)
        .map_err(FieldError::tag(Defect::WrongType))?;
    array
        .read_index_rows()
        .map_err(FieldError::tag(Defect::WrongSize))
}

/// Positions of `msg`, or `None` when absent or malformed.
pub fn extract_positions(msg: &GeometryMessage) -> Option<Vec<Vec3>> {
    if msg.vertices.is_absent() {
        return None;
    }
    match read_vec3(&msg.vertices) {
        Ok(rows) => Some(rows),
        Err(err) => {
            info!(field = "vertices", defect = %err.defect, "Ignoring vertices. vertices have {err}");
            None
        }
    }
}

/// Named per-vertex attribute of `msg`; empty when absent or malformed.
pub fn extract_attribute(msg: &GeometryMessage, name: &str) -> Vec<Vec3> {
    let Some(array) = msg.attribute(name) else {
        return Vec::new();
    };
    read_vec3(array).unwrap_or_else(|err| {
        info!(field = name, defect = %err.defect, "Ignoring {name}. {name} have {err}");
        Vec::new()
    })
}

/// Triangle indices of `msg`; empty when malformed.
pub fn extract_triangles(msg: &GeometryMessage) -> Vec<IndexTriple> {
    read_triangles(&msg.faces).unwrap_or_else(|err| {
        match err.defect {
            Defect::WrongShape => info!(
                field = "faces",
                "Ignoring faces. Only triangular faces are supported:{}",
                err.source
            ),
            Defect::WrongType => info!(
                field = "faces",
                "Ignoring faces. Triangles have wrong data type:{}",
                err.source
            ),
            Defect::WrongSize => info!(
                field = "faces",
                "Ignoring faces. Triangles have wrong data size:{}",
                err.source
            ),
        }
        Vec::new()
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use vantage_proto::{ElementType, COLORS, NORMALS};

    fn with_attribute(name: &str, array: TypedArray) -> GeometryMessage {
        let mut msg = GeometryMessage::default();
        msg.vertex_attributes.insert(name.to_owned(), array);
        msg
    }

    #[test]
    fn float32_attribute_is_upcast() {
        let msg = with_attribute(NORMALS, TypedArray::from_f32_rows(&[[0.5, -1.0, 2.0]]));
        assert_eq!(extract_attribute(&msg, NORMALS), vec![[0.5, -1.0, 2.0]]);
    }

    #[test]
    fn absent_attribute_is_empty() {
        let msg = with_attribute(NORMALS, TypedArray::from_f64_rows(&[[1.0; 3]]));
        assert!(extract_attribute(&msg, COLORS).is_empty());
    }

    #[test]
    fn defects_are_reported_in_check_order() {
        // int type and bad shape: type wins
        let arr = TypedArray::new(ElementType::I32, vec![4, 2], vec![0; 32]);
        assert_eq!(read_vec3(&arr).unwrap_err().defect, Defect::WrongType);

        let arr = TypedArray::new(ElementType::F64, vec![4, 2], vec![0; 64]);
        assert_eq!(read_vec3(&arr).unwrap_err().defect, Defect::WrongShape);

        let arr = TypedArray::new(ElementType::F64, vec![2, 3], vec![0; 47]);
        assert_eq!(read_vec3(&arr).unwrap_err().defect, Defect::WrongSize);
    }

    #[test]
    fn triangles_check_shape_before_type() {
        // float type and quad shape: shape wins
        let arr = TypedArray::new(ElementType::F32, vec![2, 4], vec![0; 32]);
        assert_eq!(read_triangles(&arr).unwrap_err().defect, Defect::WrongShape);

        let arr = TypedArray::new(ElementType::F32, vec![2, 3], vec![0; 24]);
        assert_eq!(read_triangles(&arr).unwrap_err().defect, Defect::WrongType);
    }

    #[test]
    fn triangles_widen_int32() {
        let msg = GeometryMessage {
            faces: TypedArray::from_i32_rows(&[[0, 1, 2], [2, 3, 0]]),
            ..GeometryMessage::default()
        };
        assert_eq!(extract_triangles(&msg), vec![[0, 1, 2], [2, 3, 0]]);
    }

    #[test]
    fn field_error_display_names_defect_and_diagnostic() {
        let arr = TypedArray::new(ElementType::U8, vec![1, 3], vec![0; 3]);
        let err = read_vec3(&arr).unwrap_err();
        assert!(err.to_string().starts_with("wrong data type:"));
    }
}
