//! # Datagram Builder
//!
//! Encoder for synthetic Photon datagrams. The decoder never sends anything; this
//! exists so captures can be reproduced in tests, benchmarks and fuzz corpora.
//!
//! ## Usage
//! ```rust
//! use photon_protocol::core::builder::{CommandBuilder, PacketBuilder};
//! use photon_protocol::protocol::message::MessageType;
//!
//! let datagram = PacketBuilder::new()
//!     .peer_id(1)
//!     .command(CommandBuilder::reliable(1, MessageType::Event, &[7, 0, 0]))
//!     .build();
//! assert_eq!(datagram[3], 1); // command count
//! ```

use crate::core::packet::{
    CommandHeader, CommandType, FragmentHeader, PacketHeader, COMMAND_HEADER_LENGTH,
};
use crate::protocol::message::MessageType;

/// One encoded command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandBuilder {
    command_type: CommandType,
    channel_id: u8,
    flags: u8,
    sequence_number: u32,
    body: Vec<u8>,
    length_override: Option<u32>,
}

impl CommandBuilder {
    /// A command with an arbitrary type tag and body.
    pub fn raw(command_type: CommandType, sequence_number: u32, body: &[u8]) -> Self {
        Self {
            command_type,
            channel_id: 0,
            flags: 0,
            sequence_number,
            body: body.to_vec(),
            length_override: None,
        }
    }

    /// Reliable command carrying one application message.
    pub fn reliable(sequence_number: u32, message_type: MessageType, operation: &[u8]) -> Self {
        Self::raw(
            CommandType::SendReliable,
            sequence_number,
            &reliable_body(message_type, operation),
        )
    }

    /// Unreliable command carrying one application message.
    pub fn unreliable(
        sequence_number: u32,
        unreliable_sequence: u32,
        message_type: MessageType,
        operation: &[u8],
    ) -> Self {
        let mut body = unreliable_sequence.to_be_bytes().to_vec();
        body.extend_from_slice(&reliable_body(message_type, operation));
        Self::raw(CommandType::SendUnreliable, sequence_number, &body)
    }

    /// Fragment command carrying one slice of a larger message.
    pub fn fragment(sequence_number: u32, header: FragmentHeader, chunk: &[u8]) -> Self {
        let mut body = Vec::with_capacity(20 + chunk.len());
        header.write(&mut body);
        body.extend_from_slice(chunk);
        Self::raw(CommandType::SendFragment, sequence_number, &body)
    }

    pub fn disconnect(sequence_number: u32) -> Self {
        Self::raw(CommandType::Disconnect, sequence_number, &[])
    }

    pub fn channel(mut self, channel_id: u8) -> Self {
        self.channel_id = channel_id;
        self
    }

    pub fn flags(mut self, flags: u8) -> Self {
        self.flags = flags;
        self
    }

    /// Declare a length other than the real one, for malformed-input cases.
    pub fn declared_length(mut self, length: u32) -> Self {
        self.length_override = Some(length);
        self
    }

    /// Length written into the command header.
    pub fn length(&self) -> u32 {
        self.length_override
            .unwrap_or((COMMAND_HEADER_LENGTH + self.body.len()) as u32)
    }

    pub fn write(&self, out: &mut Vec<u8>) {
        CommandHeader {
            command_type: self.command_type,
            channel_id: self.channel_id,
            flags: self.flags,
            length: self.length(),
            sequence_number: self.sequence_number,
        }
        .write(out);
        out.extend_from_slice(&self.body);
    }
}

/// Reliable message body: reserved byte, message type, operation payload.
pub fn reliable_body(message_type: MessageType, operation: &[u8]) -> Vec<u8> {
    let mut body = Vec::with_capacity(2 + operation.len());
    body.push(0);
    body.push(message_type.into());
    body.extend_from_slice(operation);
    body
}

/// Split a reliable message body into fragment commands of at most `chunk_size`
/// bytes each, keyed by `start_sequence_number`. Fragments come back in order.
pub fn fragment_message(
    start_sequence_number: u32,
    message: &[u8],
    chunk_size: usize,
) -> Vec<CommandBuilder> {
    let chunk_size = chunk_size.max(1);
    let fragment_count = message.len().div_ceil(chunk_size).max(1) as u32;

    if message.is_empty() {
        let header = FragmentHeader {
            start_sequence_number,
            fragment_count,
            fragment_number: 0,
            total_length: 0,
            fragment_offset: 0,
        };
        return vec![CommandBuilder::fragment(start_sequence_number, header, &[])];
    }

    message
        .chunks(chunk_size)
        .enumerate()
        .map(|(index, chunk)| {
            let header = FragmentHeader {
                start_sequence_number,
                fragment_count,
                fragment_number: index as u32,
                total_length: message.len() as u32,
                fragment_offset: (index * chunk_size) as u32,
            };
            CommandBuilder::fragment(start_sequence_number.wrapping_add(index as u32), header, chunk)
        })
        .collect()
}

/// Outer datagram.
#[derive(Debug, Clone, Default)]
pub struct PacketBuilder {
    peer_id: u16,
    flags: u8,
    timestamp: u32,
    challenge: u32,
    command_count: Option<u8>,
    commands: Vec<CommandBuilder>,
}

impl PacketBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn peer_id(mut self, peer_id: u16) -> Self {
        self.peer_id = peer_id;
        self
    }

    pub fn flags(mut self, flags: u8) -> Self {
        self.flags = flags;
        self
    }

    pub fn timestamp(mut self, timestamp: u32) -> Self {
        self.timestamp = timestamp;
        self
    }

    pub fn challenge(mut self, challenge: u32) -> Self {
        self.challenge = challenge;
        self
    }

    /// Declare a command count other than the number of commands added.
    pub fn command_count(mut self, count: u8) -> Self {
        self.command_count = Some(count);
        self
    }

    pub fn command(mut self, command: CommandBuilder) -> Self {
        self.commands.push(command);
        self
    }

    pub fn commands<I>(mut self, commands: I) -> Self
    where
        I: IntoIterator<Item = CommandBuilder>,
    {
        self.commands.extend(commands);
        self
    }

    pub fn header(&self) -> PacketHeader {
        PacketHeader {
            peer_id: self.peer_id,
            flags: self.flags,
            command_count: self
                .command_count
                .unwrap_or(self.commands.len().min(u8::MAX as usize) as u8),
            timestamp: self.timestamp,
            challenge: self.challenge,
        }
    }

    pub fn build(&self) -> Vec<u8> {
        let mut out = Vec::new();
        self.header().write(&mut out);
        for command in &self.commands {
            command.write(&mut out);
        }
        out
    }
}
