#![no_main]

use libfuzzer_sys::fuzz_target;
use logsieve_core::types::LogEvent;

fuzz_target!(|data: &[u8]| {
    let _ = serde_json::from_slice::<LogEvent>(data);
});
