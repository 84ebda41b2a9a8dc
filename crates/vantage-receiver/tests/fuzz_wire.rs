// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Property tests: arbitrary input never panics the decoder or handler.
#![allow(clippy::unwrap_used)]

use proptest::prelude::*;
use vantage_proto::cbor::{decode_request_header, decode_set_mesh_data, encode_request_payload};
use vantage_proto::wire::{decode_status_packet, Packet};
use vantage_proto::{ElementType, GeometryMessage, Request, SetMeshData, Status, TypedArray};
use vantage_receiver::{build_geometry, scene_channel, GeometryReceiver, MockScene};

const TAGS: [&str; 12] = [
    "<f4", "<f8", "|i1", "<i2", "<i4", "<i8", "|u1", "<u2", "<u4", "<u8", "<U8", "",
];

fn any_array() -> impl Strategy<Value = TypedArray> {
    (
        0..TAGS.len(),
        prop::collection::vec(-2i64..6, 0..4),
        prop::collection::vec(any::<u8>(), 0..96),
    )
        .prop_map(|(tag, shape, data)| TypedArray::new(ElementType::from_tag(TAGS[tag]), shape, data))
}

fn any_message() -> impl Strategy<Value = GeometryMessage> {
    (
        any_array(),
        any_array(),
        prop::option::of(any_array()),
        prop::option::of(any_array()),
    )
        .prop_map(|(vertices, faces, normals, colors)| {
            let mut msg = GeometryMessage {
                vertices,
                faces,
                ..GeometryMessage::default()
            };
            if let Some(normals) = normals {
                msg.vertex_attributes.insert("normals".into(), normals);
            }
            if let Some(colors) = colors {
                msg.vertex_attributes.insert("colors".into(), colors);
            }
            msg
        })
}

proptest! {
    #[test]
    fn fuzz_packet_decode_no_panics(bytes in prop::collection::vec(any::<u8>(), 0..1024)) {
        let _ = Packet::decode(&bytes, 4096);
    }

    #[test]
    fn fuzz_payload_decode_no_panics(bytes in prop::collection::vec(any::<u8>(), 0..1024)) {
        if let Ok((_, body)) = decode_request_header(&bytes) {
            let _ = decode_set_mesh_data(body);
        }
    }

    #[test]
    fn fuzz_handler_always_answers(bytes in prop::collection::vec(any::<u8>(), 0..512)) {
        let (dispatcher, _worker) = scene_channel(MockScene::new());
        let receiver = GeometryReceiver::new(dispatcher);
        let payload_status = receiver.handle_payload(&bytes);
        prop_assert!(payload_status.code <= Status::PROCESSING_FAILED);

        let packet = Packet::from_payload(bytes).unwrap().to_bytes();
        let reply = receiver.handle_packet(&packet).unwrap();
        let (_, status) = decode_status_packet(&reply).unwrap();
        prop_assert_eq!(status, payload_status);
    }

    #[test]
    fn fuzz_arbitrary_arrays_build_without_panics(msg in any_message()) {
        let _ = build_geometry(&msg);
    }

    #[test]
    fn gate_decides_dispatch(msg in any_message(), time in -2i32..4) {
        let (dispatcher, mut worker) = scene_channel(MockScene::new());
        let receiver = GeometryReceiver::new(dispatcher);
        let gate = msg.check_message();
        let body = SetMeshData { path: "p".into(), time, layer: "l".into(), data: msg };
        let payload = encode_request_payload(&Request::set_mesh_data(), &body).unwrap();

        let status = receiver.handle_payload(&payload);
        let dispatched = worker.drain_pending(usize::MAX);
        if gate.is_ok() {
            prop_assert!(status.is_ok());
            prop_assert_eq!(dispatched, 1);
        } else {
            prop_assert_eq!(status.code, Status::PROCESSING_FAILED);
            prop_assert_eq!(dispatched, 0);
        }
    }
}
