use std::net::SocketAddr;
use std::sync::Arc;

use gate_core::{CommandRequest, GateReq, GateResp};
use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncWrite, AsyncWriteExt, BufReader};
use tokio::net::TcpListener;
use tracing::{info, warn};

use crate::catalogue;
use crate::dispatch::Gateway;
use crate::session::SessionClient;

/// Accept loop for the chat bridge. One JSON line in, one JSON line out, per
/// connection.
pub async fn gate_server_task<C: SessionClient>(
    listener: TcpListener,
    gw: Arc<Gateway<C>>,
) -> anyhow::Result<()> {
    info!(bind=%listener.local_addr()?, "intent endpoint listening");
    loop {
        let (stream, peer) = listener.accept().await?;
        let gw = gw.clone();
        tokio::spawn(async move {
            if let Err(e) = handle_gate_conn(stream, peer, gw).await {
                warn!(peer=%peer, err=%e, "gate request failed");
            }
        });
    }
}

pub async fn handle_gate_conn<S, C>(
    stream: S,
    peer: SocketAddr,
    gw: Arc<Gateway<C>>,
) -> anyhow::Result<()>
where
    S: AsyncRead + AsyncWrite + Unpin,
    C: SessionClient,
{
    let (rd, mut wr) = tokio::io::split(stream);
    let mut rd = BufReader::new(rd);

    let mut line = String::new();
    rd.read_line(&mut line).await?;
    let line = line.trim();
    if line.is_empty() {
        return Ok(());
    }

    let resp = match serde_json::from_str::<GateReq>(line) {
        Err(e) => GateResp::Err {
            message: format!("bad json: {e}"),
        },
        Ok(GateReq::Catalogue {}) => GateResp::Catalogue {
            version: gw.version().to_string(),
            actions: catalogue::export(),
        },
        Ok(GateReq::Invoke {
            action,
            args,
            identity,
            channel,
            created_at,
        }) => {
            let mut req = CommandRequest::new(action, args, identity, channel);
            if let Some(ts) = created_at {
                req = req.at(ts);
            }
            info!(peer=%peer, action=%req.action, "invoke");
            GateResp::Reply {
                reply: gw.dispatch(req).await,
            }
        }
    };

    wr.write_all(serde_json::to_string(&resp)?.as_bytes()).await?;
    wr.write_all(b"\n").await?;
    wr.flush().await?;
    Ok(())
}
