#![no_main]

use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    // Must not panic; a parsed request must render again.
    if let Ok(transaction) = fiskal::envelope::parse_request_envelope(data) {
        let _ = fiskal::envelope::render_trzba(&transaction);
    }
});
