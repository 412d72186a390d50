//! # Wire Layout
//!
//! Outer packet and command headers of the Photon reliable-UDP transport.
//!
//! ```text
//! Packet:  [PeerId(2)] [Flags(1)] [CommandCount(1)] [Timestamp(4)] [Challenge(4)] [Command]*
//! Command: [Type(1)] [Channel(1)] [Flags(1)] [Reserved(1)] [Length(4)] [Sequence(4)] [Body]
//! ```
//!
//! A command's length includes its own 12-byte header.

use crate::core::reader::Reader;

/// Size of the outer packet header.
pub const PHOTON_HEADER_LENGTH: usize = 12;

/// Size of each command header.
pub const COMMAND_HEADER_LENGTH: usize = 12;

/// Packet flag value marking an encrypted datagram.
pub const FLAG_ENCRYPTED: u8 = 1;

/// Packet flag value marking a checksum-enabled datagram.
pub const FLAG_CRC_ENABLED: u8 = 0xCC;

/// Offset of the checksum field inside a checksum-enabled datagram.
pub const CRC_FIELD_OFFSET: usize = 0;

/// Width of the checksum field.
pub const CRC_FIELD_LENGTH: usize = 4;

/// Bytes of the fragment prefix: sequence, count, index, total length, offset.
pub const FRAGMENT_HEADER_LENGTH: usize = 20;

/// Bytes of the unreliable sequence number prefix.
pub const UNRELIABLE_HEADER_LENGTH: usize = 4;

/// Outer packet header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PacketHeader {
    pub peer_id: u16,
    pub flags: u8,
    pub command_count: u8,
    pub timestamp: u32,
    pub challenge: u32,
}

impl PacketHeader {
    /// Read the header from the start of a datagram.
    pub fn read(reader: &mut Reader<'_>) -> Option<Self> {
        if reader.remaining() < PHOTON_HEADER_LENGTH {
            return None;
        }
        Some(Self {
            peer_id: reader.read_u16_be()?,
            flags: reader.read_u8()?,
            command_count: reader.read_u8()?,
            timestamp: reader.read_u32_be()?,
            challenge: reader.read_u32_be()?,
        })
    }

    #[inline]
    pub fn is_encrypted(&self) -> bool {
        self.flags == FLAG_ENCRYPTED
    }

    #[inline]
    pub fn is_crc_enabled(&self) -> bool {
        self.flags == FLAG_CRC_ENABLED
    }

    pub fn write(&self, out: &mut Vec<u8>) {
        out.extend_from_slice(&self.peer_id.to_be_bytes());
        out.push(self.flags);
        out.push(self.command_count);
        out.extend_from_slice(&self.timestamp.to_be_bytes());
        out.extend_from_slice(&self.challenge.to_be_bytes());
    }
}

/// Command type tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CommandType {
    Acknowledge,
    Connect,
    VerifyConnect,
    Disconnect,
    Ping,
    SendReliable,
    SendUnreliable,
    SendFragment,
    Unknown(u8),
}

impl From<u8> for CommandType {
    fn from(tag: u8) -> Self {
        match tag {
            1 => CommandType::Acknowledge,
            2 => CommandType::Connect,
            3 => CommandType::VerifyConnect,
            4 => CommandType::Disconnect,
            5 => CommandType::Ping,
            6 => CommandType::SendReliable,
            7 => CommandType::SendUnreliable,
            8 => CommandType::SendFragment,
            other => CommandType::Unknown(other),
        }
    }
}

impl From<CommandType> for u8 {
    fn from(kind: CommandType) -> Self {
        match kind {
            CommandType::Acknowledge => 1,
            CommandType::Connect => 2,
            CommandType::VerifyConnect => 3,
            CommandType::Disconnect => 4,
            CommandType::Ping => 5,
            CommandType::SendReliable => 6,
            CommandType::SendUnreliable => 7,
            CommandType::SendFragment => 8,
            CommandType::Unknown(tag) => tag,
        }
    }
}

/// Header of one command inside a packet.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CommandHeader {
    pub command_type: CommandType,
    pub channel_id: u8,
    pub flags: u8,
    /// Total command length, header included.
    pub length: u32,
    pub sequence_number: u32,
}

impl CommandHeader {
    /// Read a command header. `None` when the cursor runs out first.
    pub fn read(reader: &mut Reader<'_>) -> Option<Self> {
        let command_type = CommandType::from(reader.read_u8()?);
        let channel_id = reader.read_u8()?;
        let flags = reader.read_u8()?;
        reader.skip(1)?;
        let length = reader.read_u32_be()?;
        let sequence_number = reader.read_u32_be()?;

        Some(Self {
            command_type,
            channel_id,
            flags,
            length,
            sequence_number,
        })
    }

    /// Body length after the header, or `None` when the declared length is
    /// smaller than the header itself.
    #[inline]
    pub fn body_length(&self) -> Option<usize> {
        (self.length as usize).checked_sub(COMMAND_HEADER_LENGTH)
    }

    pub fn write(&self, out: &mut Vec<u8>) {
        out.push(self.command_type.into());
        out.push(self.channel_id);
        out.push(self.flags);
        out.push(0);
        out.extend_from_slice(&self.length.to_be_bytes());
        out.extend_from_slice(&self.sequence_number.to_be_bytes());
    }
}

/// Fragment prefix of a `SendFragment` command body.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FragmentHeader {
    /// Sequence number that started the series; the reassembly key.
    pub start_sequence_number: u32,
    pub fragment_count: u32,
    pub fragment_number: u32,
    pub total_length: u32,
    pub fragment_offset: u32,
}

impl FragmentHeader {
    pub fn read(reader: &mut Reader<'_>) -> Option<Self> {
        Some(Self {
            start_sequence_number: reader.read_u32_be()?,
            fragment_count: reader.read_u32_be()?,
            fragment_number: reader.read_u32_be()?,
            total_length: reader.read_u32_be()?,
            fragment_offset: reader.read_u32_be()?,
        })
    }

    pub fn write(&self, out: &mut Vec<u8>) {
        out.extend_from_slice(&self.start_sequence_number.to_be_bytes());
        out.extend_from_slice(&self.fragment_count.to_be_bytes());
        out.extend_from_slice(&self.fragment_number.to_be_bytes());
        out.extend_from_slice(&self.total_length.to_be_bytes());
        out.extend_from_slice(&self.fragment_offset.to_be_bytes());
    }
}
