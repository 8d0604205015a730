#![no_main]

use libfuzzer_sys::fuzz_target;
use logsieve_filter::rule::loader::parse_lines;
use logsieve_filter::{LegacySeparator, ParseOptions};

fuzz_target!(|data: &[u8]| {
    let Some((&selector, rest)) = data.split_first() else {
        return;
    };
    if let Ok(content) = std::str::from_utf8(rest) {
        let options = ParseOptions {
            legacy_separator: if selector & 1 == 0 {
                LegacySeparator::Comma
            } else {
                LegacySeparator::Space
            },
            legacy_check_stack_trace: selector & 2 != 0,
            ..Default::default()
        };
        let parsed = parse_lines(content, "fuzz-input.txt", &options);
        // 모든 라인은 규칙 또는 거부 사유 중 하나
        assert!(parsed.rules.len() + parsed.rejected.len() <= content.lines().count());
    }
});
