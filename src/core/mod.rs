//! # Core Protocol Components
//!
//! Low-level framing for the Photon reliable-UDP transport.
//!
//! This module provides the stateless foundation the parser is built on: a bounds-checked
//! cursor, the outer packet and command layouts, the packet checksum, and an encoder for
//! synthesizing datagrams.
//!
//! ## Components
//! - **Reader**: Forward-only big-endian cursor over a borrowed buffer
//! - **Packet**: Packet, command and fragment headers plus wire constants
//! - **CRC**: Photon checksum with zero-and-recompute verification
//! - **Builder**: Datagram encoder for tests, benches and fuzz corpora
//!
//! ## Wire Format
//! ```text
//! [PeerId(2)] [Flags(1)] [CommandCount(1)] [Timestamp(4)] [Challenge(4)] [Command]*
//! ```
//!
//! ## Robustness
//! - Every read is bounds-checked; short buffers yield `None`, never a panic
//! - Declared lengths are checked against the header size before use

pub mod builder;
pub mod crc;
pub mod packet;
pub mod reader;
