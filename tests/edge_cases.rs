#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
//! End-to-end edge cases through the public parser API
//! Covers hostile framing, callback wiring, metrics, and shared use across threads

use photon_protocol::config::{ParserConfig, ResponseRouting};
use photon_protocol::core::builder::{fragment_message, reliable_body, CommandBuilder, PacketBuilder};
use photon_protocol::core::packet::{CommandType, FragmentHeader, FLAG_ENCRYPTED};
use photon_protocol::protocol::message::{EventData, MessageType, OperationRequest, Parameters};
use photon_protocol::{
    Callbacks, Collector, Message, MessageHandler, OperationResponse, PhotonParser, Protocol16,
    ProtocolError, Value,
};
use std::sync::{Arc, Mutex};
use std::thread;

fn event(code: u8) -> EventData {
    let mut parameters = Parameters::new();
    parameters.insert(1, Value::Integer(i32::from(code) * 10));
    EventData { code, parameters }
}

fn event_command(sequence: u32, code: u8) -> CommandBuilder {
    CommandBuilder::reliable(sequence, MessageType::Event, &Protocol16::encode_event(&event(code)))
}

// ============================================================================
// FRAMING EDGE CASES
// ============================================================================

#[test]
fn test_empty_datagram() {
    let mut parser = PhotonParser::new(Collector::new());
    parser.parse(&[]).unwrap();
    assert!(parser.handler().is_empty());
}

#[test]
fn test_header_only_datagram() {
    let datagram = PacketBuilder::new().command_count(3).build();
    assert_eq!(datagram.len(), 12);

    let mut parser = PhotonParser::new(Collector::new());
    parser.parse(&datagram).unwrap();
    assert!(parser.handler().is_empty());
    assert_eq!(parser.metrics().snapshot().commands_total, 0);
}

#[test]
fn test_zero_command_count_ignores_trailing_bytes() {
    let datagram = PacketBuilder::new()
        .command(event_command(1, 1))
        .command_count(0)
        .build();

    let mut parser = PhotonParser::new(Collector::new());
    parser.parse(&datagram).unwrap();
    assert!(parser.handler().is_empty());
}

#[test]
fn test_every_truncation_of_a_valid_packet_is_quiet() {
    let datagram = PacketBuilder::new()
        .command(CommandBuilder::disconnect(1))
        .command(event_command(2, 1))
        .commands(fragment_message(
            3,
            &reliable_body(MessageType::Event, &Protocol16::encode_event(&event(2))),
            4,
        ))
        .build();

    for len in 0..datagram.len() {
        let mut parser = PhotonParser::new(Collector::new());
        parser
            .parse(&datagram[..len])
            .unwrap_or_else(|e| panic!("truncation at {len} raised {e}"));
        assert!(parser.handler().events.len() <= 1);
    }

    let mut parser = PhotonParser::new(Collector::new());
    parser.parse(&datagram).unwrap();
    assert_eq!(parser.handler().events, vec![event(1), event(2)]);
}

#[test]
fn test_huge_declared_length_stops_packet() {
    let datagram = PacketBuilder::new()
        .command(event_command(1, 1).declared_length(u32::MAX))
        .build();

    let mut parser = PhotonParser::new(Collector::new());
    parser.parse(&datagram).unwrap();
    assert!(parser.handler().is_empty());
    assert_eq!(parser.metrics().snapshot().commands_malformed, 1);
}

#[test]
fn test_unreliable_shorter_than_its_sequence() {
    let datagram = PacketBuilder::new()
        .command(CommandBuilder::raw(CommandType::SendUnreliable, 1, &[0, 0, 0, 0, 0, 0]).declared_length(14))
        .build();

    let mut parser = PhotonParser::new(Collector::new());
    parser.parse(&datagram).unwrap();
    assert!(parser.handler().is_empty());
}

#[test]
fn test_reliable_with_empty_body() {
    let datagram = PacketBuilder::new()
        .command(CommandBuilder::raw(CommandType::SendReliable, 1, &[]))
        .command(event_command(2, 3))
        .build();

    let mut parser = PhotonParser::new(Collector::new());
    parser.parse(&datagram).unwrap();
    // the too-short message abandons the rest of the packet
    assert!(parser.handler().is_empty());
}

#[test]
fn test_fragment_shorter_than_its_header() {
    let datagram = PacketBuilder::new()
        .command(CommandBuilder::raw(CommandType::SendFragment, 1, &[0; 8]))
        .build();

    let mut parser = PhotonParser::new(Collector::new());
    parser.parse(&datagram).unwrap();
    assert_eq!(parser.pending_segments(), 0);
    assert_eq!(parser.metrics().snapshot().commands_malformed, 1);
}

#[test]
fn test_channel_and_command_flags_are_ignored() {
    let datagram = PacketBuilder::new()
        .peer_id(0xFFFF)
        .timestamp(u32::MAX)
        .command(event_command(1, 4).channel(3).flags(0xFF))
        .build();

    let mut parser = PhotonParser::new(Collector::new());
    parser.parse(&datagram).unwrap();
    assert_eq!(parser.handler().events, vec![event(4)]);
}

#[test]
fn test_encrypted_flag_is_exact_match() {
    // only the value 1 means encrypted; other flag values are processed
    for flags in [0u8, 2, 0x80] {
        let datagram = PacketBuilder::new()
            .flags(flags)
            .command(event_command(1, 1))
            .build();
        let mut parser = PhotonParser::new(Collector::new());
        parser.parse(&datagram).unwrap();
        assert_eq!(parser.handler().events.len(), 1, "flags {flags:#x}");
    }

    let datagram = PacketBuilder::new()
        .flags(FLAG_ENCRYPTED)
        .command(event_command(1, 1))
        .build();
    let mut parser = PhotonParser::new(Collector::new());
    parser.parse(&datagram).unwrap();
    assert!(parser.handler().is_empty());
}

#[test]
fn test_oversized_fragment_series_dropped() {
    let config = ParserConfig::default_with_overrides(|c| {
        c.reassembly.max_segment_length = 64;
    });
    let header = FragmentHeader {
        start_sequence_number: 1,
        fragment_count: 100,
        fragment_number: 0,
        total_length: 1_000_000,
        fragment_offset: 0,
    };
    let datagram = PacketBuilder::new()
        .command(CommandBuilder::fragment(1, header, &[0; 16]))
        .command(event_command(2, 9))
        .build();

    let mut parser = PhotonParser::with_config(Collector::new(), &config);
    parser.parse(&datagram).unwrap();

    assert_eq!(parser.pending_segments(), 0);
    assert_eq!(parser.handler().events, vec![event(9)]);
    assert_eq!(parser.metrics().snapshot().fragments_rejected, 1);
}

#[test]
fn test_decode_error_inside_reassembled_message() {
    let body = reliable_body(MessageType::OperationRequest, &[1, 0, 1, 0, 0xEE]);
    let mut parser = PhotonParser::new(Collector::new());

    let err = parser
        .parse(
            &PacketBuilder::new()
                .commands(fragment_message(40, &body, 3))
                .build(),
        )
        .unwrap_err();

    assert!(err.is_decode_error());
    assert!(matches!(err, ProtocolError::UnknownTypeCode(0xEE)));
    assert_eq!(parser.pending_segments(), 0);
}

// ============================================================================
// HANDLER WIRING
// ============================================================================

#[test]
fn test_callbacks_receive_messages() {
    let requests = Arc::new(Mutex::new(Vec::new()));
    let events = Arc::new(Mutex::new(Vec::new()));

    let handler = Callbacks::new()
        .with_request({
            let requests = Arc::clone(&requests);
            move |message| requests.lock().unwrap().push(message)
        })
        .with_event({
            let events = Arc::clone(&events);
            move |event| events.lock().unwrap().push(event)
        });

    let request = OperationRequest {
        operation_code: 2,
        parameters: Parameters::new(),
    };
    let datagram = PacketBuilder::new()
        .command(CommandBuilder::reliable(
            1,
            MessageType::OperationRequest,
            &Protocol16::encode_request(&request),
        ))
        .command(event_command(2, 5))
        .build();

    let mut parser = PhotonParser::new(handler);
    parser.parse(&datagram).unwrap();

    assert_eq!(*requests.lock().unwrap(), vec![Message::Request(request)]);
    assert_eq!(*events.lock().unwrap(), vec![event(5)]);
}

#[test]
fn test_unset_callbacks_are_skipped() {
    let mut parser = PhotonParser::new(Callbacks::new());
    parser
        .parse(&PacketBuilder::new().command(event_command(1, 1)).build())
        .unwrap();
    assert_eq!(parser.metrics().snapshot().events_decoded, 1);
}

struct Counting {
    requests: usize,
    responses: usize,
    events: usize,
}

impl MessageHandler for Counting {
    fn on_request(&mut self, _message: Message) {
        self.requests += 1;
    }

    fn on_response(&mut self, _response: OperationResponse) {
        self.responses += 1;
    }

    fn on_event(&mut self, _event: EventData) {
        self.events += 1;
    }
}

#[test]
fn test_custom_handler_with_response_routing() {
    let response = Protocol16::encode_response(&OperationResponse::default());
    let datagram = PacketBuilder::new()
        .command(CommandBuilder::reliable(1, MessageType::OperationResponse, &response))
        .command(event_command(2, 1))
        .build();

    let mut classic = PhotonParser::new(Counting {
        requests: 0,
        responses: 0,
        events: 0,
    });
    classic.parse(&datagram).unwrap();
    let counts = classic.into_handler();
    assert_eq!((counts.requests, counts.responses, counts.events), (1, 0, 1));

    let config = ParserConfig::default_with_overrides(|c| {
        c.response_routing = ResponseRouting::ResponseCallback;
    });
    let mut routed = PhotonParser::with_config(
        Counting {
            requests: 0,
            responses: 0,
            events: 0,
        },
        &config,
    );
    routed.parse(&datagram).unwrap();
    let counts = routed.handler();
    assert_eq!((counts.requests, counts.responses, counts.events), (0, 1, 1));
}

// ============================================================================
// METRICS AND SHARING
// ============================================================================

#[test]
fn test_metrics_track_packets() {
    let mut parser = PhotonParser::new(Collector::new());
    let good = PacketBuilder::new()
        .command(event_command(1, 1))
        .command(CommandBuilder::raw(CommandType::Ping, 2, &[]))
        .build();

    parser.parse(&good).unwrap();
    parser.parse(&good[..5]).unwrap();
    parser
        .parse(&PacketBuilder::new().flags(FLAG_ENCRYPTED).build())
        .unwrap();

    let snapshot = parser.metrics().snapshot();
    assert_eq!(snapshot.packets_total, 3);
    assert_eq!(snapshot.bytes_total, (good.len() + 5 + 12) as u64);
    assert_eq!(snapshot.packets_truncated, 1);
    assert_eq!(snapshot.packets_encrypted, 1);
    assert_eq!(snapshot.commands_total, 2);
    assert_eq!(snapshot.commands_unknown, 1);
    assert_eq!(snapshot.messages_decoded(), 1);
}

#[test]
fn test_parser_shared_behind_mutex() {
    let parser = Arc::new(Mutex::new(PhotonParser::new(Collector::new())));

    let workers: Vec<_> = (0..4u8)
        .map(|worker| {
            let parser = Arc::clone(&parser);
            thread::spawn(move || {
                for i in 0..25u8 {
                    let datagram = PacketBuilder::new()
                        .command(event_command(u32::from(i), worker))
                        .build();
                    parser.lock().unwrap().parse(&datagram).unwrap();
                }
            })
        })
        .collect();

    for worker in workers {
        worker.join().unwrap();
    }

    let parser = parser.lock().unwrap();
    assert_eq!(parser.handler().events.len(), 100);
    assert_eq!(parser.metrics().snapshot().events_decoded, 100);
}

#[test]
fn test_fragment_series_spanning_threads() {
    let body = reliable_body(MessageType::Event, &Protocol16::encode_event(&event(7)));
    let fragments = fragment_message(900, &body, 2);
    let parser = Arc::new(Mutex::new(PhotonParser::new(Collector::new())));

    let workers: Vec<_> = fragments
        .into_iter()
        .map(|fragment| {
            let parser = Arc::clone(&parser);
            thread::spawn(move || {
                let datagram = PacketBuilder::new().command(fragment).build();
                parser.lock().unwrap().parse(&datagram).unwrap();
            })
        })
        .collect();

    for worker in workers {
        worker.join().unwrap();
    }

    let parser = parser.lock().unwrap();
    assert_eq!(parser.handler().events, vec![event(7)]);
    assert_eq!(parser.pending_segments(), 0);
}

#[test]
fn test_decoded_messages_serialize_to_json() {
    let mut parser = PhotonParser::new(Collector::new());
    parser
        .parse(&PacketBuilder::new().command(event_command(1, 6)).build())
        .unwrap();

    let json = serde_json::to_string(&parser.handler().events).unwrap();
    let restored: Vec<EventData> = serde_json::from_str(&json).unwrap();
    assert_eq!(restored, vec![event(6)]);
}
