use std::net::SocketAddr;

use anyhow::Context;
use gate_core::{GateReq, GateResp, Identity};
use serde_json::{Map, Value};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::TcpStream;

fn usage_and_exit() -> ! {
    eprintln!(
        "rcongate_ctl\n\n\
USAGE:\n\
  rcongate_ctl [--gate-addr HOST:PORT] <command> [args...]\n\n\
ENV:\n\
  RCONGATE_ADDR  default 127.0.0.1:4300\n\n\
COMMANDS:\n\
  invoke <action> [--user NAME] [--role ROLE]... [--channel CHAN] [key=value...]\n\
  catalogue\n"
    );
    std::process::exit(2);
}

async fn send_gate_req(addr: SocketAddr, req: &GateReq) -> anyhow::Result<GateResp> {
    let mut stream = TcpStream::connect(addr)
        .await
        .with_context(|| format!("connect {addr}"))?;
    let line = serde_json::to_string(req)?;
    stream.write_all(line.as_bytes()).await?;
    stream.write_all(b"\n").await?;

    let mut rd = BufReader::new(stream);
    let mut out = Vec::new();
    rd.read_until(b'\n', &mut out).await?;
    if out.is_empty() {
        anyhow::bail!("empty gate response");
    }
    let s = String::from_utf8_lossy(&out);
    let v: GateResp = serde_json::from_str(s.trim())
        .with_context(|| format!("bad json response: {}", s.trim()))?;
    Ok(v)
}

/// Split `invoke` arguments into the request pieces. Values stay strings; the
/// gateway coerces them against the action's schema.
fn parse_invoke(rest: &[String]) -> Option<GateReq> {
    let (action, rest) = rest.split_first()?;
    let mut identity = Identity {
        display: std::env::var("USER").unwrap_or_else(|_| "rcongate_ctl".to_string()),
        roles: Vec::new(),
    };
    let mut channel = "cli".to_string();
    let mut args = Map::new();

    let mut it = rest.iter();
    while let Some(a) = it.next() {
        match a.as_str() {
            "--user" => identity.display = it.next()?.clone(),
            "--role" => identity.roles.push(it.next()?.clone()),
            "--channel" => channel = it.next()?.clone(),
            kv => {
                let (k, v) = kv.split_once('=')?;
                if k.is_empty() {
                    return None;
                }
                args.insert(k.to_string(), Value::String(v.to_string()));
            }
        }
    }

    Some(GateReq::Invoke {
        action: action.clone(),
        args,
        identity,
        channel,
        created_at: None,
    })
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let mut gate_addr: SocketAddr = std::env::var("RCONGATE_ADDR")
        .unwrap_or_else(|_| "127.0.0.1:4300".to_string())
        .parse()
        .unwrap_or_else(|_| usage_and_exit());

    let mut args = std::env::args().skip(1);
    let mut cmd: Option<String> = None;
    let mut rest: Vec<String> = Vec::new();

    while let Some(a) = args.next() {
        if a == "--gate-addr" {
            let v = args.next().unwrap_or_else(|| usage_and_exit());
            gate_addr = v.parse().unwrap_or_else(|_| usage_and_exit());
            continue;
        }
        cmd = Some(a);
        rest.extend(args);
        break;
    }

    let Some(cmd) = cmd else { usage_and_exit() };

    let req = match cmd.as_str() {
        "invoke" => parse_invoke(&rest).unwrap_or_else(|| usage_and_exit()),
        "catalogue" => {
            if !rest.is_empty() {
                usage_and_exit();
            }
            GateReq::Catalogue {}
        }
        _ => usage_and_exit(),
    };

    let resp = send_gate_req(gate_addr, &req).await?;
    println!("{}", serde_json::to_string_pretty(&resp)?);
    match resp {
        GateResp::Reply { reply } => println!("\n{}", reply.to_plain()),
        GateResp::Err { message } => anyhow::bail!("gate error: {message}"),
        GateResp::Catalogue { .. } => {}
    }

    Ok(())
}
