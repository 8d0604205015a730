#![no_main]

use std::sync::Arc;

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;

use logsieve_core::types::{Level, LogEvent};
use logsieve_filter::{DenialCounters, FilterEngine, LevelMode, Matcher, Rule, RuleSet};

/// 퍼저용 구조적 입력
#[derive(Arbitrary, Debug)]
struct FuzzInput {
    /// 규칙 목록 (최대 8개로 제한)
    rules: Vec<FuzzRule>,
    event_level: u8,
    message: Option<String>,
    stack_trace: Option<Vec<String>>,
}

#[derive(Arbitrary, Debug)]
struct FuzzRule {
    level: u8,
    pattern: String,
    regex: bool,
    equality: bool,
    check_stack_trace: bool,
}

fn level(raw: u8) -> Level {
    Level::ALL[usize::from(raw) % Level::COUNT]
}

fuzz_target!(|input: FuzzInput| {
    let rules: Vec<Rule> = input
        .rules
        .iter()
        .take(8)
        .filter_map(|r| {
            // 잘못된 정규식은 로딩 단계에서 거부되므로 건너뜀
            let matcher = if r.regex {
                Matcher::regex(&r.pattern).ok()?
            } else {
                Matcher::literal(r.pattern.clone())
            };
            let mode = if r.equality {
                LevelMode::Equality
            } else {
                LevelMode::ThresholdAtOrAbove
            };
            Some(
                Rule::new(level(r.level), matcher)
                    .with_level_mode(mode)
                    .with_stack_trace(r.check_stack_trace),
            )
        })
        .collect();

    let engine = FilterEngine::with_rules(RuleSet::new(rules), Arc::new(DenialCounters::new()));
    let event = LogEvent {
        level: level(input.event_level),
        message: input.message,
        stack_trace: input.stack_trace,
    };

    let decision = engine.decide(&event);
    // 억제된 경우에만 카운터가 증가
    assert_eq!(decision.is_deny(), engine.counters().total() == 1);
    if event.message.is_none() {
        assert!(!decision.is_deny());
    }
});
