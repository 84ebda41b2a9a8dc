// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! CBOR encoding and decoding for the wire schema.
//!
//! Every record is a CBOR map with text keys. Decoders skip keys they do not
//! know and leave missing keys at their defaults, so producers may add
//! fields freely. Indefinite-length containers are rejected.

use std::collections::BTreeMap;
use std::convert::Infallible;

use minicbor::{decode, encode, Decoder, Encoder};

use crate::array::{ElementType, TypedArray, MAX_RANK};
use crate::wire::WireError;
use crate::{GeometryMessage, Reply, Request, SetMeshData, Status};

/// Maximum number of entries in `vertex_attributes`.
pub const MAX_ATTRIBUTES: usize = 64;

// ============================================================================
// Helpers
// ============================================================================

fn definite_map(d: &mut Decoder<'_>, what: &str) -> Result<u64, decode::Error> {
    d.map()?
        .ok_or_else(|| decode::Error::message(format!("expected definite map for {what}")))
}

fn to_vec<F>(encode: F) -> Result<Vec<u8>, WireError>
where
    F: FnOnce(&mut Encoder<&mut Vec<u8>>) -> Result<(), encode::Error<Infallible>>,
{
    let mut buf = Vec::new();
    encode(&mut Encoder::new(&mut buf)).map_err(|err| WireError::Encode(err.to_string()))?;
    Ok(buf)
}

// ============================================================================
// TypedArray
// ============================================================================

fn encode_typed_array<W: encode::Write>(
    e: &mut Encoder<W>,
    arr: &TypedArray,
) -> Result<(), encode::Error<W::Error>> {
    e.map(3)?;
    e.str("type")?.str(arr.dtype.tag())?;
    e.str("shape")?.array(arr.shape.len() as u64)?;
    for dim in &arr.shape {
        e.i64(*dim)?;
    }
    e.str("data")?.bytes(&arr.data)?;
    Ok(())
}

fn decode_shape(d: &mut Decoder<'_>) -> Result<Vec<i64>, decode::Error> {
    let len = d
        .array()?
        .ok_or_else(|| decode::Error::message("expected definite array for shape"))?;
    if len > MAX_RANK as u64 {
        return Err(decode::Error::message(format!(
            "shape rank {len} exceeds MAX_RANK {MAX_RANK}"
        )));
    }
    (0..len).map(|_| d.i64()).collect()
}

fn decode_typed_array(d: &mut Decoder<'_>) -> Result<TypedArray, decode::Error> {
    let len = definite_map(d, "TypedArray")?;
    let mut arr = TypedArray::default();
    for _ in 0..len {
        match d.str()? {
            "type" => arr.dtype = ElementType::from_tag(d.str()?),
            "shape" => arr.shape = decode_shape(d)?,
            "data" => arr.data = d.bytes()?.to_vec(),
            _ => d.skip()?,
        }
    }
    Ok(arr)
}

// ============================================================================
// GeometryMessage
// ============================================================================

fn encode_geometry_message<W: encode::Write>(
    e: &mut Encoder<W>,
    msg: &GeometryMessage,
) -> Result<(), encode::Error<W::Error>> {
    let has_faces = !msg.faces.is_absent();
    let has_attributes = !msg.vertex_attributes.is_empty();
    e.map(1 + u64::from(has_faces) + u64::from(has_attributes))?;
    e.str("vertices")?;
    encode_typed_array(e, &msg.vertices)?;
    if has_faces {
        e.str("faces")?;
        encode_typed_array(e, &msg.faces)?;
    }
    if has_attributes {
        e.str("vertex_attributes")?
            .map(msg.vertex_attributes.len() as u64)?;
        for (name, arr) in &msg.vertex_attributes {
            e.str(name)?;
            encode_typed_array(e, arr)?;
        }
    }
    Ok(())
}

fn decode_attributes(
    d: &mut Decoder<'_>,
) -> Result<BTreeMap<String, TypedArray>, decode::Error> {
    let len = definite_map(d, "vertex_attributes")?;
    if len > MAX_ATTRIBUTES as u64 {
        return Err(decode::Error::message(format!(
            "vertex_attributes count {len} exceeds MAX_ATTRIBUTES {MAX_ATTRIBUTES}"
        )));
    }
    let mut attributes = BTreeMap::new();
    for _ in 0..len {
        let name = d.str()?.to_owned();
        attributes.insert(name, decode_typed_array(d)?);
    }
    Ok(attributes)
}

fn decode_geometry_message(d: &mut Decoder<'_>) -> Result<GeometryMessage, decode::Error> {
    let len = definite_map(d, "GeometryMessage")?;
    let mut msg = GeometryMessage::default();
    for _ in 0..len {
        match d.str()? {
            "vertices" => msg.vertices = decode_typed_array(d)?,
            "faces" => msg.faces = decode_typed_array(d)?,
            "vertex_attributes" => msg.vertex_attributes = decode_attributes(d)?,
            _ => d.skip()?,
        }
    }
    Ok(msg)
}

// ============================================================================
// SetMeshData
// ============================================================================

fn encode_set_mesh_data_inner<W: encode::Write>(
    e: &mut Encoder<W>,
    msg: &SetMeshData,
) -> Result<(), encode::Error<W::Error>> {
    e.map(4)?;
    e.str("path")?.str(&msg.path)?;
    e.str("time")?.i32(msg.time)?;
    e.str("layer")?.str(&msg.layer)?;
    e.str("data")?;
    encode_geometry_message(e, &msg.data)
}

fn decode_set_mesh_data_inner(d: &mut Decoder<'_>) -> Result<SetMeshData, decode::Error> {
    let len = definite_map(d, "SetMeshData")?;
    let mut msg = SetMeshData::default();
    for _ in 0..len {
        match d.str()? {
            "path" => msg.path = d.str()?.to_owned(),
            "time" => msg.time = d.i32()?,
            "layer" => msg.layer = d.str()?.to_owned(),
            "data" => msg.data = decode_geometry_message(d)?,
            _ => d.skip()?,
        }
    }
    Ok(msg)
}

// ============================================================================
// Headers and Status
// ============================================================================

fn encode_msg_id<W: encode::Write>(
    e: &mut Encoder<W>,
    msg_id: &str,
) -> Result<(), encode::Error<W::Error>> {
    e.map(1)?.str("msg_id")?.str(msg_id)?;
    Ok(())
}

fn decode_msg_id(d: &mut Decoder<'_>, what: &str) -> Result<String, decode::Error> {
    let len = definite_map(d, what)?;
    let mut msg_id = None;
    for _ in 0..len {
        match d.str()? {
            "msg_id" => msg_id = Some(d.str()?.to_owned()),
            _ => d.skip()?,
        }
    }
    msg_id.ok_or_else(|| decode::Error::message(format!("{what} is missing msg_id")))
}

fn encode_status_inner<W: encode::Write>(
    e: &mut Encoder<W>,
    status: &Status,
) -> Result<(), encode::Error<W::Error>> {
    e.map(2)?;
    e.str("code")?.i32(status.code)?;
    e.str("str")?.str(&status.message)?;
    Ok(())
}

fn decode_status_inner(d: &mut Decoder<'_>) -> Result<Status, decode::Error> {
    let len = definite_map(d, "Status")?;
    let mut status = Status::ok();
    for _ in 0..len {
        match d.str()? {
            "code" => status.code = d.i32()?,
            "str" => status.message = d.str()?.to_owned(),
            _ => d.skip()?,
        }
    }
    Ok(status)
}

// ============================================================================
// Public encode/decode functions
// ============================================================================

/// Encode a request header followed by a `set_mesh_data` body.
pub fn encode_request_payload(request: &Request, body: &SetMeshData) -> Result<Vec<u8>, WireError> {
    to_vec(|e| {
        encode_msg_id(e, &request.msg_id)?;
        encode_set_mesh_data_inner(e, body)
    })
}

/// Decode the request header and return it with the undecoded body bytes.
pub fn decode_request_header(payload: &[u8]) -> Result<(Request, &[u8]), WireError> {
    let mut decoder = Decoder::new(payload);
    let msg_id = decode_msg_id(&mut decoder, "Request")?;
    let body = &payload[decoder.position()..];
    Ok((Request { msg_id }, body))
}

/// Encode a `set_mesh_data` body on its own.
pub fn encode_set_mesh_data(msg: &SetMeshData) -> Result<Vec<u8>, WireError> {
    to_vec(|e| encode_set_mesh_data_inner(e, msg))
}

/// Decode a `set_mesh_data` body. Trailing bytes are an error.
pub fn decode_set_mesh_data(bytes: &[u8]) -> Result<SetMeshData, WireError> {
    let mut decoder = Decoder::new(bytes);
    let msg = decode_set_mesh_data_inner(&mut decoder)?;
    if decoder.position() < bytes.len() {
        return Err(WireError::Trailing("SetMeshData"));
    }
    Ok(msg)
}

/// Encode a reply header followed by a status body.
pub fn encode_reply_payload(reply: &Reply, status: &Status) -> Result<Vec<u8>, WireError> {
    to_vec(|e| {
        encode_msg_id(e, &reply.msg_id)?;
        encode_status_inner(e, status)
    })
}

/// Decode a reply header and its status body. Trailing bytes are an error.
pub fn decode_reply_payload(bytes: &[u8]) -> Result<(Reply, Status), WireError> {
    let mut decoder = Decoder::new(bytes);
    let msg_id = decode_msg_id(&mut decoder, "Reply")?;
    let status = decode_status_inner(&mut decoder)?;
    if decoder.position() < bytes.len() {
        return Err(WireError::Trailing("Status"));
    }
    Ok((Reply { msg_id }, status))
}
