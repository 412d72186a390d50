//! # Protocol Layer
//!
//! Packet parsing, command dispatch, fragment reassembly and message delivery.
//!
//! ## Flow
//! ```text
//! PhotonParser::parse
//!   └─ Dispatcher::handle_command            (once per declared command)
//!        ├─ SendReliable / SendUnreliable ─► handle_send_reliable ─► ValueDecoder ─► MessageHandler
//!        ├─ SendFragment ─► Reassembler ─(complete)─► handle_send_reliable
//!        └─ anything else ─► body skipped
//! ```
//!
//! ## Components
//! - **Parser**: Header validation, encryption and checksum gates, command loop
//! - **Dispatcher**: Per-command routing over a shared forward-only cursor
//! - **Reassembly**: Pending fragment table keyed by starting sequence number
//! - **Handler**: Callback contract and closure-based implementation
//! - **Message**: Typed requests, responses and events
//!
//! ## Failure Model
//! Input is untrusted and frequently partial. Truncation, unknown command types and
//! unknown message types never raise errors; only value payloads that fail to decode do.

pub mod dispatcher;
pub mod handler;
pub mod message;
pub mod parser;
pub mod reassembly;
