// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Headless Unix-socket geometry receiver.
//!
//! Accepts `set_mesh_data` packets, answers each with a status packet, and
//! applies decoded geometry to a headless scene on its own thread.

mod scene;

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{UnixListener, UnixStream};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;
use vantage_app_core::config::{
    ConfigError, ConfigService, ConfigStore, MemoryConfigStore,
};
use vantage_app_core::prefs::{ReceiverPrefs, RECEIVER_PREFS_KEY};
use vantage_config_fs::FsConfigStore;
use vantage_proto::wire::frame_len;
use vantage_receiver::{spawn_scene_thread, GeometryReceiver};

use crate::scene::HeadlessScene;

#[derive(Parser, Debug)]
#[command(author, version, about = "Vantage geometry receiver")]
struct Args {
    /// Unix socket to listen on (overrides the stored preference)
    #[arg(long)]
    socket: Option<PathBuf>,
    /// Maximum packet payload in bytes (overrides the stored preference)
    #[arg(long)]
    max_payload_bytes: Option<usize>,
    /// Ignore the config directory and run with defaults plus flags
    #[arg(long)]
    no_config: bool,
}

/// Stored prefs, or defaults when the config dir is unusable. Defaults are
/// persisted on first run. Without a config dir the same path runs against
/// an in-memory store.
fn load_prefs(use_config: bool) -> ReceiverPrefs {
    let loaded = if use_config {
        FsConfigStore::new()
            .map(ConfigService::new)
            .and_then(|config| load_from(&config))
    } else {
        load_from(&ConfigService::new(MemoryConfigStore::new()))
    };
    match loaded {
        Ok(prefs) => prefs,
        Err(err) => {
            warn!(%err, "receiver prefs unavailable; using defaults");
            ReceiverPrefs::default()
        }
    }
}

fn load_from<S: ConfigStore>(config: &ConfigService<S>) -> Result<ReceiverPrefs, ConfigError> {
    config.load_or_init(RECEIVER_PREFS_KEY)
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("info".parse()?))
        .init();

    let prefs = load_prefs(!args.no_config).with_overrides(args.socket, args.max_payload_bytes);

    let (dispatcher, _scene_thread) =
        spawn_scene_thread(HeadlessScene::default()).context("spawn scene thread")?;
    let receiver = GeometryReceiver::new(dispatcher).with_max_payload(prefs.max_payload_bytes);

    // Remove stale socket if present
    let _ = std::fs::remove_file(&prefs.socket_path);
    let listener = UnixListener::bind(&prefs.socket_path)
        .with_context(|| format!("bind {}", prefs.socket_path))?;
    info!(
        socket = %prefs.socket_path,
        max_payload_bytes = prefs.max_payload_bytes,
        "geometry receiver listening"
    );

    loop {
        tokio::select! {
            accepted = listener.accept() => {
                let (stream, _) = accepted?;
                let receiver = receiver.clone();
                tokio::spawn(async move {
                    if let Err(err) = handle_client(stream, receiver).await {
                        warn!(?err, "client handler error");
                    }
                });
            }
            signal = tokio::signal::ctrl_c() => {
                signal.context("install ctrl-c handler")?;
                info!("shutting down");
                break;
            }
        }
    }

    let _ = std::fs::remove_file(&prefs.socket_path);
    Ok(())
}

/// Serve one connection: reassemble frames, answer each packet in order.
///
/// Framing errors (bad magic, version, checksum, oversized payload) end the
/// connection since the byte stream can no longer be trusted.
async fn handle_client(mut stream: UnixStream, receiver: GeometryReceiver) -> Result<()> {
    let max_payload = receiver.max_payload();
    let mut read_buf = vec![0u8; 16 * 1024];
    let mut acc: Vec<u8> = Vec::with_capacity(32 * 1024);
    loop {
        let n = stream.read(&mut read_buf).await?;
        if n == 0 {
            break;
        }
        acc.extend_from_slice(&read_buf[..n]);

        while let Some(frame) = frame_len(&acc, max_payload)? {
            if acc.len() < frame {
                break;
            }
            let packet: Vec<u8> = acc.drain(..frame).collect();
            let reply = receiver.handle_packet(&packet)?;
            stream.write_all(&reply).await?;
        }
    }
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use vantage_proto::wire::{
        decode_status_packet, encode_set_mesh_data_packet, CHECKSUM_BYTES, HEADER_BYTES,
    };
    use vantage_proto::{GeometryMessage, SetMeshData, Status, TypedArray};
    use vantage_receiver::{scene_channel, MockScene};

    fn body(path: &str, vertices: TypedArray) -> SetMeshData {
        SetMeshData {
            path: path.into(),
            time: 0,
            layer: "l".into(),
            data: GeometryMessage {
                vertices,
                ..GeometryMessage::default()
            },
        }
    }

    async fn read_reply(stream: &mut UnixStream) -> Status {
        let mut header = [0u8; HEADER_BYTES];
        stream.read_exact(&mut header).await.unwrap();
        let frame = frame_len(&header, usize::MAX).unwrap().unwrap();
        let mut rest = vec![0u8; frame - HEADER_BYTES];
        stream.read_exact(&mut rest).await.unwrap();
        let mut packet = header.to_vec();
        packet.extend_from_slice(&rest);
        decode_status_packet(&packet).unwrap().1
    }

    #[tokio::test]
    async fn replies_in_order_across_split_writes() {
        let (dispatcher, mut worker) = scene_channel(MockScene::new());
        let receiver = GeometryReceiver::new(dispatcher);
        let (mut client, server) = UnixStream::pair().unwrap();
        let task = tokio::spawn(handle_client(server, receiver));

        let good = encode_set_mesh_data_packet(&body("a", TypedArray::from_f64_rows(&[[0.0; 3]])))
            .unwrap();
        let bad = encode_set_mesh_data_packet(&body(
            "b",
            TypedArray::from_i32_rows(&[[0, 1, 2]]),
        ))
        .unwrap();
        let mut stream = good.clone();
        stream.extend_from_slice(&bad);
        // split mid-header of the second packet
        let cut = good.len() + 5;
        client.write_all(&stream[..cut]).await.unwrap();
        client.write_all(&stream[cut..]).await.unwrap();

        assert!(read_reply(&mut client).await.is_ok());
        assert_eq!(
            read_reply(&mut client).await.code,
            Status::PROCESSING_FAILED
        );

        drop(client);
        task.await.unwrap().unwrap();
        assert_eq!(worker.drain_pending(usize::MAX), 1);
        assert_eq!(worker.port().added_keys(), vec!["geom_al0"]);
    }

    #[tokio::test]
    async fn corrupted_checksum_drops_the_connection() {
        let (dispatcher, _worker) = scene_channel(MockScene::new());
        let receiver = GeometryReceiver::new(dispatcher);
        let (mut client, server) = UnixStream::pair().unwrap();
        let task = tokio::spawn(handle_client(server, receiver));

        let mut packet =
            encode_set_mesh_data_packet(&body("a", TypedArray::from_f64_rows(&[[0.0; 3]])))
                .unwrap();
        let last = packet.len() - CHECKSUM_BYTES;
        packet[last] ^= 0x01;
        client.write_all(&packet).await.unwrap();

        assert!(task.await.unwrap().is_err());
        let mut buf = [0u8; 1];
        assert_eq!(client.read(&mut buf).await.unwrap(), 0);
    }

    #[test]
    fn headless_scene_keeps_latest_geometry_per_key() {
        let (dispatcher, mut worker) = scene_channel(HeadlessScene::default());
        for t in [0, 0, 1] {
            dispatcher.set_geometry(
                vantage_scene_port::PointCloud::default().into(),
                "p",
                t,
                "l",
            );
        }
        assert_eq!(worker.drain_pending(usize::MAX), 3);
        assert_eq!(worker.port().object_count(), 2);
    }

    #[test]
    fn flags_override_defaults_without_config() {
        let args = Args::parse_from([
            "vantage-receiver-service",
            "--socket",
            "/tmp/v.sock",
            "--no-config",
        ]);
        let prefs = load_prefs(!args.no_config).with_overrides(args.socket, args.max_payload_bytes);
        assert_eq!(prefs.socket_path, "/tmp/v.sock");
        assert_eq!(
            prefs.max_payload_bytes,
            vantage_app_core::prefs::DEFAULT_MAX_PAYLOAD_BYTES
        );
    }

    #[test]
    fn config_less_run_initializes_the_memory_store() {
        let config = ConfigService::new(MemoryConfigStore::new());
        let prefs = load_from(&config).unwrap();
        assert_eq!(prefs, ReceiverPrefs::default());
        let stored: Option<ReceiverPrefs> = config.load(RECEIVER_PREFS_KEY).unwrap();
        assert_eq!(stored, Some(prefs));
    }
}
