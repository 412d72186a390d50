use crate::config::ResponseRouting;
use crate::core::packet::{
    CommandHeader, CommandType, FragmentHeader, FRAGMENT_HEADER_LENGTH, UNRELIABLE_HEADER_LENGTH,
};
use crate::core::reader::Reader;
use crate::error::Result;
use crate::protocol::handler::MessageHandler;
use crate::protocol::message::{Message, MessageType};
use crate::protocol::reassembly::{Assembly, Fragment, Reassembler};
use crate::protocol16::ValueDecoder;
use crate::utils::metrics::Metrics;
use tracing::{debug, trace};

/// Whether the command loop may keep reading from the shared cursor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    /// The cursor ran out or a command was malformed; stop processing this packet.
    Stop,
}

/// Borrowed view of the parser state needed to handle commands.
///
/// Built per packet so that the handler, decoder and pending table can be borrowed
/// independently.
pub(crate) struct Dispatcher<'a, H, D> {
    pub handler: &'a mut H,
    pub decoder: &'a D,
    pub reassembler: &'a mut Reassembler,
    pub metrics: &'a Metrics,
    pub routing: ResponseRouting,
}

impl<H, D> Dispatcher<'_, H, D>
where
    H: MessageHandler,
    D: ValueDecoder,
{
    /// Consume one command from the cursor and act on it.
    pub fn handle_command(&mut self, reader: &mut Reader<'_>) -> Result<Flow> {
        let Some(command) = CommandHeader::read(reader) else {
            trace!(position = reader.position(), "No further commands in packet");
            return Ok(Flow::Stop);
        };
        self.metrics.command_read();

        let Some(mut length) = command.body_length() else {
            debug!(
                length = command.length,
                "Command shorter than its own header - abandoning packet"
            );
            self.metrics.command_malformed();
            return Ok(Flow::Stop);
        };

        trace!(
            command_type = ?command.command_type,
            channel_id = command.channel_id,
            sequence_number = command.sequence_number,
            length,
            "Command"
        );

        match command.command_type {
            CommandType::Disconnect => Ok(Flow::Continue),
            CommandType::SendUnreliable => {
                if reader.skip(UNRELIABLE_HEADER_LENGTH).is_none() {
                    return Ok(self.malformed("unreliable sequence number"));
                }
                let Some(rest) = length.checked_sub(UNRELIABLE_HEADER_LENGTH) else {
                    return Ok(self.malformed("unreliable command length"));
                };
                length = rest;
                self.handle_send_reliable(reader, length)
            }
            CommandType::SendReliable => self.handle_send_reliable(reader, length),
            CommandType::SendFragment => self.handle_send_fragment(reader, length),
            other => {
                self.metrics.command_unknown();
                if reader.skip(length).is_none() {
                    return Ok(self.malformed("unhandled command body"));
                }
                trace!(command_type = ?other, length, "Skipped command");
                Ok(Flow::Continue)
            }
        }
    }

    /// Decode one application message and hand it to the matching callback.
    pub fn handle_send_reliable(&mut self, reader: &mut Reader<'_>, length: usize) -> Result<Flow> {
        let Some(operation_length) = length.checked_sub(2) else {
            return Ok(self.malformed("reliable message header"));
        };
        if reader.skip(1).is_none() {
            return Ok(self.malformed("reliable message header"));
        }
        let Some(tag) = reader.read_u8() else {
            return Ok(self.malformed("message type"));
        };
        let Some(payload) = reader.read_bytes(operation_length) else {
            return Ok(self.malformed("operation payload"));
        };

        match MessageType::from(tag) {
            MessageType::OperationRequest => {
                let request = self.decode(|decoder| decoder.decode_request(payload))?;
                self.metrics.request_decoded();
                trace!(operation_code = request.operation_code, "Operation request");
                self.handler.on_request(Message::Request(request));
            }
            MessageType::OperationResponse => {
                let response = self.decode(|decoder| decoder.decode_response(payload))?;
                self.metrics.response_decoded();
                trace!(
                    operation_code = response.operation_code,
                    return_code = response.return_code,
                    "Operation response"
                );
                match self.routing {
                    ResponseRouting::RequestCallback => {
                        self.handler.on_request(Message::Response(response))
                    }
                    ResponseRouting::ResponseCallback => self.handler.on_response(response),
                }
            }
            MessageType::Event => {
                let event = self.decode(|decoder| decoder.decode_event(payload))?;
                self.metrics.event_decoded();
                trace!(code = event.code, "Event");
                self.handler.on_event(event);
            }
            MessageType::Unknown(tag) => {
                self.metrics.message_unknown();
                trace!(message_type = tag, operation_length, "Ignored message type");
            }
        }

        Ok(Flow::Continue)
    }

    /// Feed one fragment to the reassembler, decoding the message if it completes.
    pub fn handle_send_fragment(&mut self, reader: &mut Reader<'_>, length: usize) -> Result<Flow> {
        let Some(fragment_length) = length.checked_sub(FRAGMENT_HEADER_LENGTH) else {
            return Ok(self.malformed("fragment header"));
        };
        let Some(header) = FragmentHeader::read(reader) else {
            return Ok(self.malformed("fragment header"));
        };
        let Some(payload) = reader.read_bytes(fragment_length) else {
            return Ok(self.malformed("fragment payload"));
        };
        self.metrics.fragment_read();

        let assembly = self.reassembler.accept(Fragment { header, payload });
        let evicted = self.reassembler.take_evicted();
        if evicted > 0 {
            self.metrics.segments_evicted(evicted as u64);
        }

        match assembly {
            Assembly::Pending => {}
            Assembly::Rejected(_) => self.metrics.fragment_rejected(),
            Assembly::Complete(message) => {
                self.metrics.segment_completed();
                // a completed series is framed like a fresh reliable command body;
                // its flow result concerns only the synthesized cursor
                self.handle_send_reliable(&mut Reader::new(&message), message.len())?;
            }
        }

        Ok(Flow::Continue)
    }

    fn decode<T, F>(&self, decode: F) -> Result<T>
    where
        F: FnOnce(&D) -> Result<T>,
    {
        decode(self.decoder).inspect_err(|e| {
            self.metrics.decode_error();
            debug!(error = %e, "Operation payload failed to decode");
        })
    }

    fn malformed(&self, what: &'static str) -> Flow {
        self.metrics.command_malformed();
        debug!(what, "Truncated command - abandoning packet");
        Flow::Stop
    }
}
