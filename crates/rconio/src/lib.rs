//! `rconio`: small IO helpers for text remote-console sessions.
//!
//! RCON servers do not frame their replies. A reply is either one JSON document
//! (often with no trailing newline) or one line of text, so the reader here
//! buffers until it can prove one of those is complete:
//! - prompt scanning (`read_past`, `read_byte`) for the login handshake,
//! - reply extraction (`read_reply`) without copying (`BytesMut::split_to(..).freeze()`).

pub mod reply;
