#![no_main]

use libfuzzer_sys::fuzz_target;
use photon_protocol::{Protocol16, ValueDecoder};

fuzz_target!(|data: &[u8]| {
    // Anything that decodes must re-encode to something that decodes
    if let Ok(value) = Protocol16::decode_value(data) {
        let encoded = Protocol16::encode_value(&value);
        assert!(Protocol16::decode_value(&encoded).is_ok());
    }
    let _ = Protocol16.decode_request(data);
    let _ = Protocol16.decode_response(data);
    let _ = Protocol16.decode_event(data);
});
