// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Packet framing for the receiver socket.
//!
//! Packet layout:
//!
//! ``MAGIC(4) || VERSION(2) || FLAGS(2) || LENGTH(4) || PAYLOAD || CHECKSUM(32)``
//!
//! * PAYLOAD is two CBOR items: a header (`Request` / `Reply`) and a body
//! * CHECKSUM = blake3-256 over HEADER (first 12 bytes) || PAYLOAD

use blake3::Hasher;
use thiserror::Error;

use crate::cbor::{decode_reply_payload, encode_reply_payload, encode_request_payload};
use crate::{Reply, Request, SetMeshData, Status};

/// Protocol magic constant "VGM!".
pub const MAGIC: [u8; 4] = *b"VGM!";
/// Wire protocol version (big-endian u16).
pub const VERSION: u16 = 0x0001;
/// Reserved flags (set to zero for v1).
pub const FLAGS: u16 = 0x0000;
/// Header length in bytes.
pub const HEADER_BYTES: usize = 12;
/// Checksum length in bytes.
pub const CHECKSUM_BYTES: usize = 32;
/// Default payload cap (64 MiB).
pub const DEFAULT_MAX_PAYLOAD: usize = 64 * 1024 * 1024;

/// Framing and codec errors.
#[derive(Debug, Error)]
pub enum WireError {
    /// Fewer bytes than the frame requires.
    #[error("incomplete packet: need {needed} bytes, have {have}")]
    Incomplete {
        /// Bytes required for the full frame.
        needed: usize,
        /// Bytes available.
        have: usize,
    },
    /// Magic constant mismatch.
    #[error("bad magic")]
    BadMagic,
    /// Unknown protocol version.
    #[error("unsupported version {0}")]
    UnsupportedVersion(u16),
    /// Payload exceeds the configured cap.
    #[error("payload of {len} bytes exceeds limit of {max}")]
    PayloadTooLarge {
        /// Declared payload length.
        len: usize,
        /// Configured limit.
        max: usize,
    },
    /// blake3 checksum mismatch.
    #[error("checksum mismatch")]
    Checksum,
    /// Bytes left over after a complete item.
    #[error("trailing bytes in {0}")]
    Trailing(&'static str),
    /// Malformed CBOR.
    #[error("decode error: {0}")]
    Decode(#[from] minicbor::decode::Error),
    /// Encoder failure.
    #[error("encode error: {0}")]
    Encode(String),
}

fn checksum(header: &[u8], payload: &[u8]) -> blake3::Hash {
    let mut hasher = Hasher::new();
    hasher.update(header);
    hasher.update(payload);
    hasher.finalize()
}

/// A full packet (header + payload + checksum).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Packet {
    /// Raw header (12 bytes).
    pub header: [u8; HEADER_BYTES],
    /// CBOR payload bytes.
    pub payload: Vec<u8>,
    /// blake3 checksum over header||payload.
    pub checksum: [u8; CHECKSUM_BYTES],
}

impl Packet {
    /// Build a packet around `payload`.
    pub fn from_payload(payload: Vec<u8>) -> Result<Self, WireError> {
        let len = u32::try_from(payload.len()).map_err(|_| WireError::PayloadTooLarge {
            len: payload.len(),
            max: u32::MAX as usize,
        })?;
        let mut header = [0u8; HEADER_BYTES];
        header[0..4].copy_from_slice(&MAGIC);
        header[4..6].copy_from_slice(&VERSION.to_be_bytes());
        header[6..8].copy_from_slice(&FLAGS.to_be_bytes());
        header[8..12].copy_from_slice(&len.to_be_bytes());
        let checksum = *checksum(&header, &payload).as_bytes();
        Ok(Self {
            header,
            payload,
            checksum,
        })
    }

    /// Serialize header, payload and checksum.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(HEADER_BYTES + self.payload.len() + CHECKSUM_BYTES);
        out.extend_from_slice(&self.header);
        out.extend_from_slice(&self.payload);
        out.extend_from_slice(&self.checksum);
        out
    }

    /// Decode one packet from the front of `bytes`, returning it and the
    /// number of bytes consumed.
    pub fn decode(bytes: &[u8], max_payload: usize) -> Result<(Self, usize), WireError> {
        let frame = frame_len(bytes, max_payload)?.ok_or(WireError::Incomplete {
            needed: HEADER_BYTES,
            have: bytes.len(),
        })?;
        if bytes.len() < frame {
            return Err(WireError::Incomplete {
                needed: frame,
                have: bytes.len(),
            });
        }
        let mut header = [0u8; HEADER_BYTES];
        header.copy_from_slice(&bytes[..HEADER_BYTES]);
        let payload = &bytes[HEADER_BYTES..frame - CHECKSUM_BYTES];
        let mut sum = [0u8; CHECKSUM_BYTES];
        sum.copy_from_slice(&bytes[frame - CHECKSUM_BYTES..frame]);

        if checksum(&header, payload) != blake3::Hash::from(sum) {
            return Err(WireError::Checksum);
        }
        Ok((
            Self {
                header,
                payload: payload.to_vec(),
                checksum: sum,
            },
            frame,
        ))
    }
}

/// Total frame length announced by the header at the front of `buf`.
///
/// Returns `Ok(None)` while fewer than [`HEADER_BYTES`] are buffered. Bad
/// magic, unknown version and oversized payloads fail before any payload
/// bytes are read.
pub fn frame_len(buf: &[u8], max_payload: usize) -> Result<Option<usize>, WireError> {
    if buf.len() < HEADER_BYTES {
        return Ok(None);
    }
    if buf[0..4] != MAGIC {
        return Err(WireError::BadMagic);
    }
    let version = u16::from_be_bytes([buf[4], buf[5]]);
    if version != VERSION {
        return Err(WireError::UnsupportedVersion(version));
    }
    let len = u32::from_be_bytes([buf[8], buf[9], buf[10], buf[11]]) as usize;
    if len > max_payload {
        return Err(WireError::PayloadTooLarge {
            len,
            max: max_payload,
        });
    }
    Ok(Some(HEADER_BYTES + len + CHECKSUM_BYTES))
}

/// Encode a `set_mesh_data` request into a full packet.
pub fn encode_set_mesh_data_packet(body: &SetMeshData) -> Result<Vec<u8>, WireError> {
    let payload = encode_request_payload(&Request::set_mesh_data(), body)?;
    Ok(Packet::from_payload(payload)?.to_bytes())
}

/// Encode a status reply into a full packet.
pub fn encode_status_packet(status: &Status) -> Result<Vec<u8>, WireError> {
    let payload = encode_reply_payload(&Reply::default(), status)?;
    Ok(Packet::from_payload(payload)?.to_bytes())
}

/// Decode a status reply packet.
pub fn decode_status_packet(bytes: &[u8]) -> Result<(Reply, Status), WireError> {
    let (packet, _) = Packet::decode(bytes, DEFAULT_MAX_PAYLOAD)?;
    decode_reply_payload(&packet.payload)
}
