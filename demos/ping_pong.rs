//! Example: Ping/Pong between two peers
//!
//! Both peers register the same packets in the same order, then talk over an in-memory
//! duplex stream. The server answers every `Ping` with a `Pong`; a global handler on each
//! side logs every packet it sees.
//!
//! Run with: `cargo run --example ping_pong`

#![allow(clippy::uninlined_format_args)]

use std::sync::Arc;

use packet_delivery::config::ProtocolConfig;
use packet_delivery::prelude::*;
use packet_delivery::utils::{global_metrics, logging::init_logging};
use tokio::sync::mpsc;
use tracing::info;

#[derive(Debug, Default)]
struct Ping {
    seq: i32,
    sent_at: i64,
}

impl Packet for Ping {
    fn write(&self, cursor: &mut ByteCursor<'_>) -> Result<()> {
        cursor.write_int(self.seq);
        cursor.write_long(self.sent_at);
        Ok(())
    }

    fn read(&mut self, cursor: &mut ByteCursor<'_>) -> Result<()> {
        self.seq = cursor.read_int()?;
        self.sent_at = cursor.read_long()?;
        Ok(())
    }
}

#[derive(Debug, Default)]
struct Pong {
    seq: i32,
    sent_at: i64,
    server: String,
}

impl Packet for Pong {
    fn write(&self, cursor: &mut ByteCursor<'_>) -> Result<()> {
        cursor.write_int(self.seq);
        cursor.write_long(self.sent_at);
        cursor.write_string(&self.server)
    }

    fn read(&mut self, cursor: &mut ByteCursor<'_>) -> Result<()> {
        self.seq = cursor.read_int()?;
        self.sent_at = cursor.read_long()?;
        self.server = cursor.read_string()?;
        Ok(())
    }
}

fn build_codec(config: &ProtocolConfig) -> Result<Arc<FrameCodec>> {
    let vault = PacketVault::new().with::<Ping>()?.with::<Pong>()?;
    Ok(Arc::new(FrameCodec::with_config(
        Arc::new(vault),
        config.codec.clone(),
    )))
}

fn log_everything(side: &'static str) -> EventHandler {
    EventHandler::any(Priority::High, move |packet| {
        info!(side, packet = packet.packet_name(), "Received");
        Ok(())
    })
    .with_id(side)
}

fn now_millis() -> i64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_millis() as i64)
        .unwrap_or_default()
}

#[tokio::main]
async fn main() -> std::result::Result<(), Box<dyn std::error::Error>> {
    let config = ProtocolConfig::from_env()?;
    config.validate_strict()?;
    init_logging(&config.logging);

    println!("=== Ping/Pong Demo ===\n");

    let (client_io, server_io) = tokio::io::duplex(64 * 1024);

    // Server: reply to every Ping on the connection it came from
    let mut server_router = EventRouter::with_config(config.router.clone());
    server_router.register(log_everything("server"))?;
    server_router.register(EventHandler::on_with_context::<Ping, _>(
        Priority::Medium,
        |ping, ctx| {
            ctx.reply(&Pong {
                seq: ping.seq,
                sent_at: ping.sent_at,
                server: "demo-server".into(),
            })
        },
    ))?;
    let server = Endpoint::from_shared(build_codec(&config)?, Arc::new(server_router));
    let (server_sink, server_outbound) = ChannelSink::new();

    // Client: forward every Pong to main
    let (pong_tx, mut pong_rx) = mpsc::unbounded_channel();
    let mut client_router = EventRouter::with_config(config.router.clone());
    client_router.register(log_everything("client"))?;
    client_router.register(EventHandler::on::<Pong, _>(Priority::Medium, move |pong| {
        pong_tx
            .send((pong.seq, now_millis() - pong.sent_at, pong.server.clone()))
            .map_err(|_| ProtocolError::ConnectionClosed)
    }))?;
    let client = Endpoint::from_shared(build_codec(&config)?, Arc::new(client_router));
    let (client_sink, client_outbound) = ChannelSink::new();

    let server_task =
        tokio::spawn(async move { server.run(server_io, server_sink, server_outbound).await });
    let client_runner = client.clone();
    let client_peer = client_sink.clone();
    let client_task = tokio::spawn(async move {
        client_runner
            .run(client_io, client_peer, client_outbound)
            .await
    });

    let rounds = 5;
    for seq in 0..rounds {
        client.send(
            &client_sink,
            &Ping {
                seq,
                sent_at: now_millis(),
            },
        )?;
    }

    for _ in 0..rounds {
        match pong_rx.recv().await {
            Some((seq, rtt, server)) => println!("pong #{} from {} in {}ms", seq, server, rtt),
            None => break,
        }
    }

    client_task.abort();
    server_task.await??;

    global_metrics().log_metrics();
    let snapshot = global_metrics().snapshot();
    println!(
        "\nframes encoded: {}, decoded: {}, dispatches: {}",
        snapshot.frames_encoded, snapshot.frames_decoded, snapshot.dispatches
    );

    Ok(())
}
