use std::future::Future;

use rconio::reply::ReplyReader;
use rconproto::auth::{AUTH_ACCEPTED, AUTH_MARKER, DISCONNECT, PASSWORD_PROMPT, login_token};
use rconproto::{FailureKind, RconFailure, RconOutcome};
use tokio::io::AsyncWriteExt;
use tokio::net::TcpStream;
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tracing::debug;

use crate::registry::ServerDescriptor;

/// Largest reply buffered from one server before the exchange fails.
const MAX_REPLY_LEN: usize = 256 * 1024;

/// One connect/authenticate/send/receive/disconnect cycle per call.
pub trait SessionClient: Send + Sync + 'static {
    fn exchange(
        &self,
        target: &ServerDescriptor,
        command: &str,
    ) -> impl Future<Output = RconOutcome> + Send;
}

#[derive(Debug, Clone, Default)]
pub struct PavlovClient;

impl SessionClient for PavlovClient {
    async fn exchange(&self, target: &ServerDescriptor, command: &str) -> RconOutcome {
        let mut session = match RconSession::open(target).await {
            Ok(s) => s,
            Err(f) => return RconOutcome::Failure(f),
        };
        let outcome = session.send(command).await;
        session.close().await;
        outcome
    }
}

/// An authenticated connection. Dropping it closes the socket.
struct RconSession {
    rd: ReplyReader<OwnedReadHalf>,
    wr: OwnedWriteHalf,
}

impl RconSession {
    async fn open(target: &ServerDescriptor) -> Result<Self, RconFailure> {
        let stream = TcpStream::connect((target.address.as_str(), target.port))
            .await
            .map_err(|e| {
                RconFailure::new(
                    FailureKind::Connect,
                    format!("connect {}:{}: {e}", target.address, target.port),
                )
            })?;
        let (rd, wr) = stream.into_split();
        let mut s = Self {
            rd: ReplyReader::new(rd).max_reply_len(MAX_REPLY_LEN),
            wr,
        };

        s.rd.read_past(PASSWORD_PROMPT).await.map_err(io_failure)?;
        s.wr
            .write_all(login_token(&target.secret).as_bytes())
            .await
            .map_err(io_failure)?;
        s.rd.read_past(AUTH_MARKER).await.map_err(|e| {
            RconFailure::new(FailureKind::Auth, format!("no auth answer: {e}"))
        })?;
        match s.rd.read_byte().await {
            Ok(Some(AUTH_ACCEPTED)) => {
                debug!(server=%target.name, "rcon authenticated");
                Ok(s)
            }
            Ok(_) => Err(RconFailure::new(
                FailureKind::Auth,
                "server rejected the password",
            )),
            Err(e) => Err(io_failure(e)),
        }
    }

    async fn send(&mut self, command: &str) -> RconOutcome {
        if let Err(e) = self.wr.write_all(command.as_bytes()).await {
            return RconOutcome::Failure(io_failure(e));
        }
        match self.rd.read_reply().await {
            Ok(Some(raw)) => RconOutcome::from_reply(&raw),
            Ok(None) => RconOutcome::Failure(RconFailure::new(
                FailureKind::EmptyReply,
                "connection closed before a reply",
            )),
            Err(e) => RconOutcome::Failure(io_failure(e)),
        }
    }

    async fn close(mut self) {
        let _ = self.wr.write_all(DISCONNECT.as_bytes()).await;
        let _ = self.wr.shutdown().await;
    }
}

fn io_failure(e: std::io::Error) -> RconFailure {
    RconFailure::new(FailureKind::Io, e.to_string())
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use tokio::io::AsyncReadExt;
    use tokio::net::TcpListener;

    pub(crate) fn target(port: u16, secret: &str) -> ServerDescriptor {
        ServerDescriptor {
            name: "test".to_string(),
            address: "127.0.0.1".to_string(),
            port,
            secret: secret.to_string(),
        }
    }

    /// Minimal RCON server: one session, answers `reply` to whatever command
    /// arrives. Returns the port and a handle yielding the received command.
    async fn fake_server(
        secret: &'static str,
        reply: &'static [u8],
    ) -> (u16, tokio::task::JoinHandle<Option<String>>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        let h = tokio::spawn(async move {
            let (mut s, _) = listener.accept().await.unwrap();
            s.write_all(b"Password: ").await.unwrap();
            let mut token = [0u8; 32];
            s.read_exact(&mut token).await.unwrap();
            if token[..] != *login_token(secret).as_bytes() {
                s.write_all(b"Authenticated=0").await.unwrap();
                return None;
            }
            s.write_all(b"Authenticated=1").await.unwrap();
            let mut buf = vec![0u8; 512];
            let n = s.read(&mut buf).await.unwrap();
            let cmd = String::from_utf8_lossy(&buf[..n]).to_string();
            s.write_all(reply).await.unwrap();
            let mut rest = Vec::new();
            let _ = s.read_to_end(&mut rest).await;
            assert_eq!(&rest[..], DISCONNECT.as_bytes());
            Some(cmd)
        });
        (port, h)
    }

    #[tokio::test]
    async fn exchange_round_trip() {
        let (port, h) = fake_server("s3cret", br#"{"Command":"Kick","Kick":true}"#).await;
        let out = PavlovClient.exchange(&target(port, "s3cret"), "kick bob").await;
        assert_eq!(
            out,
            RconOutcome::Success(r#"{"Command":"Kick","Kick":true}"#.to_string())
        );
        assert_eq!(h.await.unwrap().as_deref(), Some("kick bob"));
    }

    #[tokio::test]
    async fn wrong_password_is_auth_failure() {
        let (port, h) = fake_server("s3cret", b"unused").await;
        let out = PavlovClient.exchange(&target(port, "nope"), "kick bob").await;
        match out {
            RconOutcome::Failure(f) => assert_eq!(f.kind, FailureKind::Auth),
            other => panic!("unexpected {other:?}"),
        }
        assert!(h.await.unwrap().is_none());
    }

    #[tokio::test]
    async fn refused_connection_is_connect_failure() {
        let port = {
            let l = TcpListener::bind("127.0.0.1:0").await.unwrap();
            l.local_addr().unwrap().port()
        };
        let out = PavlovClient.exchange(&target(port, "x"), "RotateMap").await;
        match out {
            RconOutcome::Failure(f) => assert_eq!(f.kind, FailureKind::Connect),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[tokio::test]
    async fn blank_reply_then_close_is_failure() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        tokio::spawn(async move {
            let (mut s, _) = listener.accept().await.unwrap();
            s.write_all(b"Password: ").await.unwrap();
            let mut token = [0u8; 32];
            s.read_exact(&mut token).await.unwrap();
            s.write_all(b"Authenticated=1").await.unwrap();
            let mut buf = vec![0u8; 512];
            let _ = s.read(&mut buf).await.unwrap();
            s.write_all(b"\r\n").await.unwrap();
        });

        let out = PavlovClient.exchange(&target(port, "s3cret"), "RotateMap").await;
        match out {
            RconOutcome::Failure(f) => assert_eq!(f.kind, FailureKind::EmptyReply),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[tokio::test]
    async fn endless_reply_is_io_failure() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        tokio::spawn(async move {
            let (mut s, _) = listener.accept().await.unwrap();
            s.write_all(b"Password: ").await.unwrap();
            let mut token = [0u8; 32];
            s.read_exact(&mut token).await.unwrap();
            s.write_all(b"Authenticated=1").await.unwrap();
            let mut buf = vec![0u8; 512];
            let _ = s.read(&mut buf).await.unwrap();
            // No newline, more than the client will buffer.
            let _ = s.write_all(&vec![b'x'; MAX_REPLY_LEN * 2]).await;
        });

        let out = PavlovClient.exchange(&target(port, "s3cret"), "MapList").await;
        match out {
            RconOutcome::Failure(f) => {
                assert_eq!(f.kind, FailureKind::Io);
                assert!(f.to_string().contains("reply too long"), "{f}");
            }
            other => panic!("unexpected {other:?}"),
        }
    }
}
