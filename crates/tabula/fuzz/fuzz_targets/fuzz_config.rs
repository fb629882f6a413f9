//! Fuzz target for configuration documents.
//!
//! Arbitrary JSON must either compile into a transformer or fail with an
//! error; a compiled transformer must survive a small input table.

#![no_main]

use libfuzzer_sys::fuzz_target;
use tabula::Transformer;

const SAMPLE: &[u8] = b"name,value,when\nMelbourne,21.5,2014-01-13\nGeelong,,2014-01-14\n";

fuzz_target!(|data: &[u8]| {
    let Ok(text) = std::str::from_utf8(data) else {
        return;
    };

    if let Ok(transformer) = Transformer::from_json_str(text) {
        let _ = transformer.transform_bytes(SAMPLE);
    }
});
