//! 메트릭 상수 및 설명 등록
//!
//! 모든 Prometheus 메트릭의 이름과 설명을 중앙에서 정의합니다.
//! 각 모듈은 이 상수를 사용하여 `metrics::counter!()`, `metrics::gauge!()`
//! 매크로를 호출합니다.
//!
//! # 네이밍 컨벤션
//!
//! - 접두어: `logsieve_`
//! - 모듈명: `filter_`, `daemon_`
//! - 접미어: `_total` (counter), 없음 (gauge)
//!
//! # 사용 예시
//!
//! ```ignore
//! use metrics::counter;
//!
//! counter!(logsieve_core::metrics::FILTER_DECISIONS_TOTAL).increment(1);
//! ```

// ─── 레이블 키 상수 ────────────────────────────────────────────────

/// 로그 레벨 레이블 키 (TRACE, DEBUG, INFO, WARN, ERROR, FATAL)
pub const LABEL_LEVEL: &str = "level";

/// 결과 레이블 키 (published, retained)
pub const LABEL_RESULT: &str = "result";

// ─── Filter 메트릭 ──────────────────────────────────────────────────

/// Filter: 판정 호출 수 (counter)
pub const FILTER_DECISIONS_TOTAL: &str = "logsieve_filter_decisions_total";

/// Filter: 레벨별 억제된 이벤트 수 (counter, label: level)
pub const FILTER_DENIED_TOTAL: &str = "logsieve_filter_denied_total";

/// Filter: 규칙 리로드 수 (counter, label: result)
pub const FILTER_RELOADS_TOTAL: &str = "logsieve_filter_reloads_total";

/// Filter: 로드 실패한 소스 수 (counter)
pub const FILTER_SOURCE_ERRORS_TOTAL: &str = "logsieve_filter_source_errors_total";

/// Filter: 거부된 규칙 레코드 수 (counter)
pub const FILTER_RULE_ERRORS_TOTAL: &str = "logsieve_filter_rule_errors_total";

/// Filter: 현재 게시된 규칙 수 (gauge)
pub const FILTER_RULES_LOADED: &str = "logsieve_filter_rules_loaded";

// ─── Daemon 메트릭 ──────────────────────────────────────────────────

/// Daemon: 입력에서 읽은 이벤트 수 (counter)
pub const DAEMON_EVENTS_READ_TOTAL: &str = "logsieve_daemon_events_read_total";

/// Daemon: 이벤트로 해석하지 못한 입력 라인 수 (counter)
pub const DAEMON_MALFORMED_LINES_TOTAL: &str = "logsieve_daemon_malformed_lines_total";

// ─── 설명 등록 함수 ─────────────────────────────────────────────────

/// 모든 메트릭의 설명(description)을 등록합니다.
///
/// 이 함수는 전역 레코더 설치 후 한 번만 호출해야 합니다.
pub fn describe_all() {
    use metrics::{describe_counter, describe_gauge};

    // Filter
    describe_counter!(
        FILTER_DECISIONS_TOTAL,
        "Total number of filter decisions made"
    );
    describe_counter!(
        FILTER_DENIED_TOTAL,
        "Total number of events denied, by event level"
    );
    describe_counter!(
        FILTER_RELOADS_TOTAL,
        "Total number of rule reloads, by outcome"
    );
    describe_counter!(
        FILTER_SOURCE_ERRORS_TOTAL,
        "Total number of rule sources that failed to load"
    );
    describe_counter!(
        FILTER_RULE_ERRORS_TOTAL,
        "Total number of rule records rejected during parsing"
    );
    describe_gauge!(
        FILTER_RULES_LOADED,
        "Number of rules in the currently published rule set"
    );

    // Daemon
    describe_counter!(
        DAEMON_EVENTS_READ_TOTAL,
        "Total number of log events read from the input stream"
    );
    describe_counter!(
        DAEMON_MALFORMED_LINES_TOTAL,
        "Total number of input lines passed through because they were not valid events"
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALL_METRIC_NAMES: &[&str] = &[
        FILTER_DECISIONS_TOTAL,
        FILTER_DENIED_TOTAL,
        FILTER_RELOADS_TOTAL,
        FILTER_SOURCE_ERRORS_TOTAL,
        FILTER_RULE_ERRORS_TOTAL,
        FILTER_RULES_LOADED,
        DAEMON_EVENTS_READ_TOTAL,
        DAEMON_MALFORMED_LINES_TOTAL,
    ];

    #[test]
    fn all_metrics_start_with_logsieve_prefix() {
        for name in ALL_METRIC_NAMES {
            assert!(
                name.starts_with("logsieve_"),
                "Metric '{}' does not start with 'logsieve_' prefix",
                name
            );
        }
    }

    #[test]
    fn counters_end_with_total() {
        for name in ALL_METRIC_NAMES.iter().filter(|n| **n != FILTER_RULES_LOADED) {
            assert!(name.ends_with("_total"), "counter '{}' lacks _total", name);
        }
    }

    #[test]
    fn describe_all_does_not_panic() {
        // 레코더가 설치되지 않아도 패닉하지 않아야 함
        describe_all();
    }

    #[test]
    fn label_keys_are_lowercase() {
        for label in [LABEL_LEVEL, LABEL_RESULT] {
            assert_eq!(label.to_lowercase(), label);
        }
    }
}
