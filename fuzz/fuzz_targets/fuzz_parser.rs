#![no_main]

use libfuzzer_sys::fuzz_target;
use photon_protocol::config::ParserConfig;
use photon_protocol::{Collector, PhotonParser};

fuzz_target!(|data: &[u8]| {
    // Each input is a run of datagrams, split on a two-byte length prefix so
    // fragment series can span packets
    let config = ParserConfig::default_with_overrides(|c| {
        c.reassembly.max_segment_length = 1024 * 1024;
        c.reassembly.max_pending_segments = Some(64);
    });
    let mut parser = PhotonParser::with_config(Collector::new(), &config);

    let mut rest = data;
    while rest.len() >= 2 {
        let len = u16::from_be_bytes([rest[0], rest[1]]) as usize;
        rest = &rest[2..];
        let take = len.min(rest.len());
        let _ = parser.parse(&rest[..take]);
        rest = &rest[take..];
    }
});
