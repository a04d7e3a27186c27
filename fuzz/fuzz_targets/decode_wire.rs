#![no_main]

use cipher_envelope::wire;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if let Ok(parts) = wire::decode_wire(data) {
        // Anything that parses must re-encode to the same bytes.
        let again = wire::encode_wire(parts.suite, &parts.envelope).unwrap();
        assert_eq!(again, data);
    }
});
