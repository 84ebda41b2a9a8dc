// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Wire schema for the Vantage geometry receiver.
//!
//! A producer sends a request header followed by a `set_mesh_data` body; the
//! receiver answers with a reply header followed by a [`Status`]. Both are
//! CBOR items carried in checksummed packets (see [`wire`]).

use std::collections::BTreeMap;
use std::fmt;

pub mod array;
pub mod cbor;
pub mod wire;

pub use array::{ArrayCheckError, ElementType, TypedArray};

/// Request id of the geometry upload message.
pub const SET_MESH_DATA: &str = "set_mesh_data";

/// Reply id carried in front of every [`Status`].
pub const STATUS_MSG_ID: &str = "status";

/// Attribute key for per-vertex normals.
pub const NORMALS: &str = "normals";

/// Attribute key for per-vertex colors.
pub const COLORS: &str = "colors";

/// Request header naming the body that follows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Request {
    /// Message id (e.g. `"set_mesh_data"`).
    pub msg_id: String,
}

impl Request {
    /// Header for a `set_mesh_data` body.
    pub fn set_mesh_data() -> Self {
        Self {
            msg_id: SET_MESH_DATA.to_owned(),
        }
    }
}

/// Reply header naming the body that follows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reply {
    /// Message id of the reply body (always `"status"` today).
    pub msg_id: String,
}

impl Default for Reply {
    fn default() -> Self {
        Self {
            msg_id: STATUS_MSG_ID.to_owned(),
        }
    }
}

/// Outcome of one request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Status {
    /// Numeric status code; `0` is success.
    pub code: i32,
    /// Human readable description; empty on success.
    pub message: String,
}

impl Status {
    /// Success.
    pub const OK: i32 = 0;
    /// The request named an unknown message id.
    pub const UNSUPPORTED_MSG_ID: i32 = 1;
    /// The request could not be decoded.
    pub const UNPACKING_FAILED: i32 = 2;
    /// The request decoded but its content was rejected.
    pub const PROCESSING_FAILED: i32 = 3;

    /// Successful status.
    pub fn ok() -> Self {
        Self {
            code: Self::OK,
            message: String::new(),
        }
    }

    /// Unknown message id.
    pub fn unsupported_msg_id() -> Self {
        Self {
            code: Self::UNSUPPORTED_MSG_ID,
            message: "unsupported msg_id".to_owned(),
        }
    }

    /// Body could not be decoded.
    pub fn unpacking_failed() -> Self {
        Self {
            code: Self::UNPACKING_FAILED,
            message: "error during unpacking".to_owned(),
        }
    }

    /// Body was rejected.
    pub fn processing_failed() -> Self {
        Self {
            code: Self::PROCESSING_FAILED,
            message: "error while processing message".to_owned(),
        }
    }

    /// Append `":" + detail` to the message.
    pub fn with_detail(mut self, detail: impl fmt::Display) -> Self {
        self.message = format!("{}:{detail}", self.message);
        self
    }

    /// True for [`Status::OK`].
    pub fn is_ok(&self) -> bool {
        self.code == Self::OK
    }
}

/// Geometry payload: positions plus optional topology and attributes.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GeometryMessage {
    /// `[N, 3]` positions.
    pub vertices: TypedArray,
    /// `[M, 3]` triangle indices; absent for point clouds.
    pub faces: TypedArray,
    /// Optional per-vertex arrays keyed by name (`normals`, `colors`, ...).
    pub vertex_attributes: BTreeMap<String, TypedArray>,
}

impl GeometryMessage {
    /// Message-level gate for the positions array.
    ///
    /// Positions are required: they must be float32/float64, shaped
    /// `[N, 3]`, and carry exactly the bytes the shape implies. An omitted
    /// field fails; `N = 0` passes and yields an empty geometry.
    pub fn check_message(&self) -> Result<(), ArrayCheckError> {
        self.vertices
            .check_type(&array::FLOAT_TYPES)
            .and_then(|()| self.vertices.check_shape(&array::ROWS_OF_THREE))
            .and_then(|()| self.vertices.check_data_len())
            .map_err(|err| err.in_field("vertices"))
    }

    /// Look up a vertex attribute by name.
    pub fn attribute(&self, name: &str) -> Option<&TypedArray> {
        self.vertex_attributes.get(name)
    }
}

/// `set_mesh_data` body: geometry plus its scene placement.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SetMeshData {
    /// Object path in the scene.
    pub path: String,
    /// Frame time; values below 1 mark the start of a new stream.
    pub time: i32,
    /// Layer name.
    pub layer: String,
    /// Geometry payload.
    pub data: GeometryMessage,
}
