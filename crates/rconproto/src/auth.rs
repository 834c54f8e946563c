use md5::{Digest, Md5};

pub const PASSWORD_PROMPT: &[u8] = b"Password:";
pub const AUTH_MARKER: &[u8] = b"Authenticated=";
pub const AUTH_ACCEPTED: u8 = b'1';

pub const DISCONNECT: &str = "Disconnect";

/// Login token for a shared secret: lowercase md5 hex.
pub fn login_token(secret: &str) -> String {
    hex_lower(&Md5::digest(secret.as_bytes()))
}

fn hex_lower(b: &[u8]) -> String {
    const LUT: &[u8; 16] = b"0123456789abcdef";
    let mut s = String::with_capacity(b.len() * 2);
    for &x in b {
        s.push(LUT[(x >> 4) as usize] as char);
        s.push(LUT[(x & 0x0f) as usize] as char);
    }
    s
}
