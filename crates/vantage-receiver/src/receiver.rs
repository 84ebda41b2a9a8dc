// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Per-message handling: decode, gate, build, dispatch, reply.

use tracing::{instrument, warn};
use vantage_proto::cbor::{decode_request_header, decode_set_mesh_data};
use vantage_proto::wire::{encode_status_packet, Packet, WireError, DEFAULT_MAX_PAYLOAD};
use vantage_proto::{Request, SetMeshData, Status, SET_MESH_DATA};

use crate::builder::build_geometry;
use crate::dispatch::SceneDispatcher;

/// Turns request packets into scene insertions and reply statuses.
///
/// Holds no per-message state; one receiver can serve any number of
/// connections.
#[derive(Clone, Debug)]
pub struct GeometryReceiver {
    dispatcher: SceneDispatcher,
    max_payload: usize,
}

impl GeometryReceiver {
    /// Receiver posting to `dispatcher` with the default payload cap.
    pub fn new(dispatcher: SceneDispatcher) -> Self {
        Self {
            dispatcher,
            max_payload: DEFAULT_MAX_PAYLOAD,
        }
    }

    /// Override the packet payload cap.
    #[must_use]
    pub fn with_max_payload(mut self, max_payload: usize) -> Self {
        self.max_payload = max_payload;
        self
    }

    /// Configured packet payload cap.
    pub fn max_payload(&self) -> usize {
        self.max_payload
    }

    /// Handle one decoded `set_mesh_data` body.
    ///
    /// A malformed positions array rejects the message and nothing is
    /// dispatched. Otherwise the geometry is posted to the scene thread and
    /// the status is OK, even if optional fields were dropped.
    #[instrument(
        skip_all,
        fields(msg_id = %request.msg_id, path = %msg.path, layer = %msg.layer, time = msg.time)
    )]
    pub fn process_message(&self, request: &Request, msg: SetMeshData) -> Status {
        if let Err(err) = msg.data.check_message() {
            warn!(%err, "rejecting geometry message");
            return Status::processing_failed().with_detail(err);
        }
        let geometry = build_geometry(&msg.data);
        self.dispatcher
            .set_geometry(geometry, &msg.path, msg.time, &msg.layer);
        Status::ok()
    }

    /// Route a request payload (header item plus body item) by `msg_id`.
    pub fn handle_payload(&self, payload: &[u8]) -> Status {
        let (request, body) = match decode_request_header(payload) {
            Ok(parts) => parts,
            Err(err) => {
                warn!(%err, "failed to unpack request header");
                return Status::unpacking_failed().with_detail(err);
            }
        };
        match request.msg_id.as_str() {
            SET_MESH_DATA => match decode_set_mesh_data(body) {
                Ok(msg) => self.process_message(&request, msg),
                Err(err) => {
                    warn!(%err, "failed to unpack set_mesh_data");
                    Status::unpacking_failed().with_detail(err)
                }
            },
            other => {
                warn!(msg_id = other, "unsupported msg_id");
                Status::unsupported_msg_id().with_detail(other)
            }
        }
    }

    /// Handle one complete request packet and return the reply packet.
    ///
    /// Framing errors (magic, version, size, checksum) are returned to the
    /// caller; everything past the framing is answered with a status.
    pub fn handle_packet(&self, bytes: &[u8]) -> Result<Vec<u8>, WireError> {
        let (packet, _) = Packet::decode(bytes, self.max_payload)?;
        let status = self.handle_payload(&packet.payload);
        encode_status_packet(&status)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::dispatch::scene_channel;
    use crate::MockScene;
    use vantage_proto::cbor::encode_request_payload;
    use vantage_proto::wire::{decode_status_packet, encode_set_mesh_data_packet};
    use vantage_proto::{GeometryMessage, TypedArray};

    fn body(vertices: TypedArray) -> SetMeshData {
        SetMeshData {
            path: "obj".into(),
            time: 0,
            layer: "main".into(),
            data: GeometryMessage {
                vertices,
                ..GeometryMessage::default()
            },
        }
    }

    #[test]
    fn valid_packet_replies_ok_and_dispatches() {
        let (dispatcher, mut worker) = scene_channel(MockScene::new());
        let receiver = GeometryReceiver::new(dispatcher);
        let packet =
            encode_set_mesh_data_packet(&body(TypedArray::from_f64_rows(&[[1.0; 3]]))).unwrap();

        let reply = receiver.handle_packet(&packet).unwrap();
        let (_, status) = decode_status_packet(&reply).unwrap();
        assert!(status.is_ok());
        assert_eq!(worker.drain_pending(8), 1);
        assert!(worker.port().geometry("geom_objmain0").is_some());
    }

    #[test]
    fn unknown_msg_id_gets_code_one() {
        let (dispatcher, _worker) = scene_channel(MockScene::new());
        let receiver = GeometryReceiver::new(dispatcher);
        let request = Request {
            msg_id: "get_camera".into(),
        };
        let payload = encode_request_payload(&request, &SetMeshData::default()).unwrap();
        let status = receiver.handle_payload(&payload);
        assert_eq!(status.code, Status::UNSUPPORTED_MSG_ID);
        assert_eq!(status.message, "unsupported msg_id:get_camera");
    }

    #[test]
    fn garbage_payload_gets_code_two() {
        let (dispatcher, _worker) = scene_channel(MockScene::new());
        let receiver = GeometryReceiver::new(dispatcher);
        let status = receiver.handle_payload(&[0xff, 0x00]);
        assert_eq!(status.code, Status::UNPACKING_FAILED);
        assert!(status.message.starts_with("error during unpacking:"));
    }

    #[test]
    fn oversized_packet_is_a_framing_error() {
        let (dispatcher, _worker) = scene_channel(MockScene::new());
        let receiver = GeometryReceiver::new(dispatcher).with_max_payload(8);
        let packet =
            encode_set_mesh_data_packet(&body(TypedArray::from_f64_rows(&[[1.0; 3]]))).unwrap();
        assert!(matches!(
            receiver.handle_packet(&packet),
            Err(WireError::PayloadTooLarge { max: 8, .. })
        ));
    }
}
