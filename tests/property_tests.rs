//! Property-based tests using proptest
//!
//! These tests validate parser invariants across randomly generated datagrams,
//! fragment partitions and arrival orders.

#![allow(clippy::expect_used, clippy::unwrap_used)]

use photon_protocol::config::{ParserConfig, ReassemblyConfig};
use photon_protocol::core::builder::{reliable_body, CommandBuilder, PacketBuilder};
use photon_protocol::core::packet::FragmentHeader;
use photon_protocol::protocol::message::{EventData, MessageType, Parameters};
use photon_protocol::protocol::reassembly::{Assembly, Fragment, Reassembler};
use photon_protocol::{Collector, PhotonParser, Protocol16, Value};
use proptest::prelude::*;

/// Cut `len` bytes at the given fractions into contiguous `(offset, length)` ranges.
fn partition(len: usize, cuts: &[f64]) -> Vec<(usize, usize)> {
    let mut points: Vec<usize> = cuts
        .iter()
        .map(|f| ((len as f64) * f) as usize)
        .filter(|&p| p > 0 && p < len)
        .collect();
    points.push(0);
    points.push(len);
    points.sort_unstable();
    points.dedup();
    points.windows(2).map(|w| (w[0], w[1] - w[0])).collect()
}

// Property: random datagrams never panic and never leave the parser unusable
proptest! {
    #[test]
    fn prop_random_datagrams_never_panic(
        datagrams in prop::collection::vec(prop::collection::vec(any::<u8>(), 0..256), 1..16)
    ) {
        let config = ParserConfig::default_with_overrides(|c| {
            c.reassembly.max_segment_length = 64 * 1024;
        });
        let mut parser = PhotonParser::with_config(Collector::new(), &config);
        for datagram in &datagrams {
            let _ = parser.parse(datagram);
        }
        prop_assert_eq!(parser.metrics().snapshot().packets_total, datagrams.len() as u64);
    }
}

// Property: random command bodies behind a valid header never panic
proptest! {
    #[test]
    fn prop_random_command_bodies_never_panic(
        command_type in 0u8..=10,
        body in prop::collection::vec(any::<u8>(), 0..128),
        declared in prop::option::of(0u32..512),
    ) {
        let mut command = CommandBuilder::raw(command_type.into(), 1, &body);
        if let Some(length) = declared {
            command = command.declared_length(length);
        }
        let datagram = PacketBuilder::new().command(command).build();
        let mut parser = PhotonParser::new(Collector::new());
        let _ = parser.parse(&datagram);
    }
}

// Property: any partition in any order reassembles byte-for-byte, exactly once
proptest! {
    #[test]
    fn prop_reassembly_any_order(
        message in prop::collection::vec(any::<u8>(), 1..2048),
        cuts in prop::collection::vec(0.0f64..1.0, 0..12),
        order in any::<prop::sample::Index>(),
        seed in any::<u64>(),
    ) {
        let ranges = partition(message.len(), &cuts);
        let mut shuffled = ranges.clone();
        // deterministic shuffle driven by the generated inputs
        let rotate = order.index(shuffled.len());
        shuffled.rotate_left(rotate);
        if seed % 2 == 1 {
            shuffled.reverse();
        }

        let mut reassembler = Reassembler::new(ReassemblyConfig::default());
        let mut completions = Vec::new();
        for (i, (offset, length)) in shuffled.iter().enumerate() {
            let header = FragmentHeader {
                start_sequence_number: 77,
                fragment_count: ranges.len() as u32,
                fragment_number: i as u32,
                total_length: message.len() as u32,
                fragment_offset: *offset as u32,
            };
            let assembly = reassembler.accept(Fragment {
                header,
                payload: &message[*offset..offset + length],
            });
            if let Assembly::Complete(bytes) = assembly {
                completions.push((i, bytes));
            }
        }

        prop_assert_eq!(completions.len(), 1);
        let (index, bytes) = &completions[0];
        prop_assert_eq!(*index, shuffled.len() - 1);
        prop_assert_eq!(&bytes[..], &message[..]);
        prop_assert!(reassembler.is_empty());
    }
}

// Property: a fragmented event delivered through the parser decodes unchanged
proptest! {
    #[test]
    fn prop_fragmented_event_end_to_end(
        text in "[a-zA-Z0-9 ]{0,300}",
        code in any::<u8>(),
        chunk in 1usize..64,
        start in any::<u32>(),
    ) {
        let mut parameters = Parameters::new();
        parameters.insert(0, Value::String(text));
        let event = EventData { code, parameters };
        let body = reliable_body(MessageType::Event, &Protocol16::encode_event(&event));

        let mut parser = PhotonParser::new(Collector::new());
        let commands: Vec<_> = body
            .chunks(chunk)
            .enumerate()
            .map(|(i, piece)| {
                CommandBuilder::fragment(
                    start.wrapping_add(i as u32),
                    FragmentHeader {
                        start_sequence_number: start,
                        fragment_count: body.len().div_ceil(chunk) as u32,
                        fragment_number: i as u32,
                        total_length: body.len() as u32,
                        fragment_offset: (i * chunk) as u32,
                    },
                    piece,
                )
            })
            .collect();

        for command in commands.into_iter().rev() {
            parser.parse(&PacketBuilder::new().command(command).build()).unwrap();
        }

        prop_assert_eq!(&parser.handler().events, &vec![event]);
        prop_assert_eq!(parser.pending_segments(), 0);
    }
}
