//! Fuzz target for annotation JSON parsing.
//!
//! Feeds arbitrary bytes to the annotation reader, checking for panics,
//! crashes, or hangs.

#![no_main]

use labelprep::ir::io_annotations::from_annotation_slice;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if data.len() > 10 * 1024 * 1024 {
        return;
    }

    let _ = from_annotation_slice(data);
});
