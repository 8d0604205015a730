#![no_main]

use libfuzzer_sys::fuzz_target;
use logsieve_filter::ParseOptions;
use logsieve_filter::rule::loader::parse_structured;

fuzz_target!(|data: &[u8]| {
    // YAML 파서는 &str을 받으므로 UTF-8 변환 필요
    if let Ok(content) = std::str::from_utf8(data) {
        let _ = parse_structured(content, "fuzz-input.yml", &ParseOptions::default());
    }
});
