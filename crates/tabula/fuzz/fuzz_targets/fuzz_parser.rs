//! Fuzz target for the delimited-file loader and schema resolver.
//!
//! This fuzzer tests that loading:
//! 1. Never panics on malformed input
//! 2. Handles all delimiter combinations
//! 3. Survives header and footer skipping on short files

#![no_main]

use libfuzzer_sys::fuzz_target;
use serde_json::json;
use tabula::Transformer;

fuzz_target!(|data: &[u8]| {
    // Only process reasonable-sized inputs to avoid OOM
    if data.len() > 100_000 {
        return;
    }

    let plain = Transformer::from_value(&json!({ "infer_column_types": true }));
    let skipping = Transformer::from_value(&json!({
        "column_headers_are_on_row_number": 2,
        "number_of_rows_to_skip_at_file_end": 1
    }));

    for transformer in [plain, skipping].into_iter().flatten() {
        let _ = transformer.transform_bytes(data);
    }
});
