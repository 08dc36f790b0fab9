//! Fuzz target for label-line generation.
//!
//! Whatever the reader accepts must normalize in both label layouts, and the
//! category map built from a document always covers that document.

#![no_main]

use labelprep::conversion::fuzz_normalize_document;
use labelprep::PrepError;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if data.len() > 1024 * 1024 {
        return;
    }

    if let Err(err @ PrepError::CategoryMapMismatch { .. }) = fuzz_normalize_document(data) {
        panic!("map built from the document rejected it: {err}");
    }
});
