/// LogiTalk relay server
use anyhow::Result;
use clap::Parser;
use futures::{SinkExt, TryStreamExt};
use logitalk_protocol::{parse, Frame, FrameCodec};
use std::{
    net::SocketAddr,
    sync::atomic::{AtomicUsize, Ordering},
};
use tokio::{
    net::{TcpListener, TcpStream},
    sync::broadcast::{self, error::RecvError},
};
use tokio_util::codec::{FramedRead, FramedWrite};
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;

// Types used by broadcast channel to distribute frames
type ClientId = usize;
type RelayedFrame = (ClientId, Frame);

const DEFAULT_NAME: &str = "Anonymous";

#[derive(Debug, Parser)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Bind to this addr
    #[arg(short, long, default_value = "localhost:8080")]
    addr: String,

    /// Also relay each frame back to the client that sent it
    #[arg(long)]
    echo: bool,

    /// Log at debug level
    #[arg(long)]
    debug: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let default_directive = if args.debug {
        "logitalk_server=debug,logitalk_protocol=debug,info"
    } else {
        "logitalk_server=info,warn"
    };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directive));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let listener = TcpListener::bind(&args.addr).await?;
    info!(addr = %args.addr, echo = args.echo, "listening");
    serve(listener, args.echo).await
}

async fn serve(listener: TcpListener, echo: bool) -> Result<()> {
    let (relay_tx, _relay_rx) = broadcast::channel::<RelayedFrame>(256);
    let client_id = AtomicUsize::from(0);

    loop {
        let (stream, addr) = listener.accept().await?;
        tokio::spawn(handle_client(
            client_id.fetch_add(1, Ordering::Relaxed),
            stream,
            addr,
            echo,
            relay_tx.clone(),
            relay_tx.subscribe(),
        ));
    }
}

async fn handle_client(
    client_id: ClientId,
    stream: TcpStream,
    addr: SocketAddr,
    echo: bool,
    relay_tx: broadcast::Sender<RelayedFrame>,
    mut relay_rx: broadcast::Receiver<RelayedFrame>,
) {
    info!(%addr, client_id, "connection accepted");
    let (rx, tx) = tokio::io::split(stream);
    let mut reader = FramedRead::new(rx, FrameCodec::default());
    let mut writer = FramedWrite::new(tx, FrameCodec::default());
    let mut name: Option<String> = None;
    loop {
        tokio::select! {
            // Receive records from the client
            maybe_record = reader.try_next() => {
                let record = match maybe_record {
                    Ok(Some(record)) => record,
                    Ok(None) => break,
                    Err(e) => {
                        warn!(client_id, error = %e, "read failed");
                        break;
                    }
                };
                let frame = match parse(&record) {
                    Ok(frame) => frame,
                    Err(e) => {
                        debug!(client_id, %record, error = %e, "dropping malformed record");
                        continue;
                    }
                };
                if let Some(author) = frame.author() {
                    if name.as_deref() != Some(author) {
                        info!(client_id, %author, "client identified");
                        name = Some(author.to_owned());
                    }
                }
                if let Err(e) = relay_tx.send((client_id, frame)) {
                    warn!(client_id, error = %e, "relay error");
                }
            }

            // Forward frames to the client
            maybe_frame = relay_rx.recv() => {
                match maybe_frame {
                    Ok((sender_id, frame)) => {
                        if echo || sender_id != client_id {
                            if let Err(e) = writer.send(frame).await {
                                warn!(client_id, error = %e, "write failed");
                                break;
                            }
                        }
                    }
                    Err(RecvError::Lagged(skipped)) => {
                        warn!(client_id, skipped, "client fell behind, frames skipped");
                    }
                    Err(RecvError::Closed) => break,
                }
            }
        }
    }
    info!(
        client_id,
        name = name.as_deref().unwrap_or(DEFAULT_NAME),
        "client left"
    );
}
