use crate::config::{ParserConfig, ResponseRouting};
use crate::core::crc;
use crate::core::packet::{PacketHeader, CRC_FIELD_OFFSET, PHOTON_HEADER_LENGTH};
use crate::core::reader::Reader;
use crate::error::Result;
use crate::protocol::dispatcher::{Dispatcher, Flow};
use crate::protocol::handler::MessageHandler;
use crate::protocol::reassembly::Reassembler;
use crate::protocol16::{Protocol16, ValueDecoder};
use crate::utils::metrics::Metrics;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, instrument, trace};

/// Passive decoder for Photon datagrams.
///
/// Feed each captured datagram payload to [`parse`](PhotonParser::parse); decoded
/// messages are delivered to the handler in parsing order. The only state carried
/// between calls is the pending fragment table.
///
/// A parser is single-writer. To share one between threads, wrap it in a mutex
/// and hold the lock for each `parse` call.
pub struct PhotonParser<H, D = Protocol16> {
    handler: H,
    decoder: D,
    reassembler: Reassembler,
    routing: ResponseRouting,
    metrics: Arc<Metrics>,
}

impl<H: MessageHandler> PhotonParser<H> {
    /// Parser with the default configuration and the Protocol16 decoder.
    pub fn new(handler: H) -> Self {
        Self::with_decoder(handler, Protocol16, &ParserConfig::default())
    }

    pub fn with_config(handler: H, config: &ParserConfig) -> Self {
        Self::with_decoder(handler, Protocol16, config)
    }
}

impl<H, D> PhotonParser<H, D>
where
    H: MessageHandler,
    D: ValueDecoder,
{
    pub fn with_decoder(handler: H, decoder: D, config: &ParserConfig) -> Self {
        Self {
            handler,
            decoder,
            reassembler: Reassembler::new(config.reassembly.clone()),
            routing: config.response_routing,
            metrics: Arc::new(Metrics::new()),
        }
    }

    /// Decode one datagram.
    ///
    /// Truncated, encrypted and checksum-failing datagrams are dropped without
    /// error. Only a payload the value decoder rejects is reported; commands that
    /// preceded it in the same datagram have already been delivered.
    #[instrument(level = "trace", skip_all, fields(len = datagram.len()))]
    pub fn parse(&mut self, datagram: &[u8]) -> Result<()> {
        self.metrics.packet_received(datagram.len() as u64);

        if datagram.len() < PHOTON_HEADER_LENGTH {
            self.metrics.packet_truncated();
            trace!("Datagram shorter than packet header - dropping");
            return Ok(());
        }

        let mut reader = Reader::new(datagram);
        let Some(header) = PacketHeader::read(&mut reader) else {
            self.metrics.packet_truncated();
            return Ok(());
        };

        if header.is_encrypted() {
            self.metrics.packet_encrypted();
            debug!(peer_id = header.peer_id, "Encrypted datagram - dropping");
            return Ok(());
        }

        if header.is_crc_enabled() && !crc::verify(datagram, CRC_FIELD_OFFSET) {
            self.metrics.checksum_failed();
            debug!(peer_id = header.peer_id, "Checksum mismatch - dropping");
            return Ok(());
        }

        trace!(
            peer_id = header.peer_id,
            command_count = header.command_count,
            timestamp = header.timestamp,
            "Packet"
        );

        let mut dispatcher = Dispatcher {
            handler: &mut self.handler,
            decoder: &self.decoder,
            reassembler: &mut self.reassembler,
            metrics: &self.metrics,
            routing: self.routing,
        };

        for _ in 0..header.command_count {
            if dispatcher.handle_command(&mut reader)? == Flow::Stop {
                break;
            }
        }

        Ok(())
    }

    pub fn handler(&self) -> &H {
        &self.handler
    }

    pub fn handler_mut(&mut self) -> &mut H {
        &mut self.handler
    }

    pub fn into_handler(self) -> H {
        self.handler
    }

    /// Shared handle to this parser's counters.
    pub fn metrics(&self) -> Arc<Metrics> {
        Arc::clone(&self.metrics)
    }

    pub fn reassembler(&self) -> &Reassembler {
        &self.reassembler
    }

    /// Number of fragment series still waiting for data.
    pub fn pending_segments(&self) -> usize {
        self.reassembler.len()
    }

    /// Drop incomplete series older than the configured TTL.
    pub fn evict_expired(&mut self) -> usize {
        let removed = self.reassembler.evict_expired();
        self.metrics.segments_evicted(removed as u64);
        removed
    }

    /// Drop incomplete series older than `max_age`.
    pub fn evict_older_than(&mut self, max_age: Duration) -> usize {
        let removed = self.reassembler.evict_older_than(max_age);
        self.metrics.segments_evicted(removed as u64);
        removed
    }

    /// Drop every incomplete series.
    pub fn clear_pending(&mut self) -> usize {
        let removed = self.reassembler.clear();
        self.metrics.segments_evicted(removed as u64);
        removed
    }
}

impl<H, D> std::fmt::Debug for PhotonParser<H, D> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PhotonParser")
            .field("pending_segments", &self.reassembler.len())
            .field("routing", &self.routing)
            .finish_non_exhaustive()
    }
}
