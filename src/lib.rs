//! # Photon Protocol
//!
//! Passive decoder for datagrams of the Photon reliable-UDP transport (an ENet-style
//! command layer carrying Protocol16-encoded operations and events).
//!
//! Hand each captured datagram payload to a [`PhotonParser`]; it validates the outer
//! header, drops encrypted or checksum-failing packets, walks the commands, reassembles
//! fragmented messages and delivers decoded operation requests, operation responses
//! and events to a [`MessageHandler`].
//!
//! The decoder never sends, acknowledges or retransmits anything and performs no I/O.
//!
//! ## Usage
//! ```rust
//! use photon_protocol::core::builder::{CommandBuilder, PacketBuilder};
//! use photon_protocol::protocol::handler::Collector;
//! use photon_protocol::protocol::message::{EventData, MessageType};
//! use photon_protocol::{PhotonParser, Protocol16};
//!
//! let event = EventData { code: 7, ..Default::default() };
//! let datagram = PacketBuilder::new()
//!     .command(CommandBuilder::reliable(1, MessageType::Event, &Protocol16::encode_event(&event)))
//!     .build();
//!
//! let mut parser = PhotonParser::new(Collector::new());
//! parser.parse(&datagram).unwrap();
//! assert_eq!(parser.handler().events, vec![event]);
//! ```
//!
//! ## Modules
//! - [`core`](crate::core): cursor, wire layouts, checksum, datagram builder
//! - [`protocol`]: parser, dispatcher, reassembly, handlers, messages
//! - [`protocol16`]: typed value decoding
//! - [`config`]: TOML/env configuration
//! - [`utils`]: logging and metrics

#![cfg_attr(not(test), deny(clippy::unwrap_used, clippy::expect_used))]

pub mod config;
pub mod core;
pub mod error;
pub mod protocol;
pub mod protocol16;
pub mod utils;

pub use config::ParserConfig;
pub use error::{ProtocolError, Result};
pub use protocol::handler::{Callbacks, Collector, MessageHandler};
pub use protocol::message::{EventData, Message, MessageType, OperationRequest, OperationResponse};
pub use protocol::parser::PhotonParser;
pub use protocol16::{Protocol16, Value, ValueDecoder};
