//! 필터 엔진 -- 이벤트 판정 및 규칙 세트 게시
//!
//! [`FilterEngine`]은 현재 게시된 [`RuleSet`]을 [`ArcSwap`]으로 보관합니다.
//! `decide`는 호출 시점의 규칙 세트 하나를 잠금 없이 로드하여 끝까지 그 세트로만
//! 평가하고, `publish`는 새 세트를 원자적으로 교체합니다.
//! 판정 중인 호출은 교체 이후에도 이전 세트를 안전하게 계속 사용합니다.

use std::collections::BTreeMap;
use std::sync::Arc;

use arc_swap::ArcSwap;
use metrics::{counter, gauge};

use logsieve_core::metrics as m;
use logsieve_core::pipeline::EventFilter;
use logsieve_core::types::{Decision, Level, LogEvent};

use crate::counters::DenialCounters;
use crate::rule::RuleSet;

/// 필터 엔진
///
/// # 사용 예시
/// ```ignore
/// let engine = FilterEngine::new(Arc::new(DenialCounters::new()));
/// engine.publish(loader.load().await);
///
/// if engine.decide(&event).is_deny() {
///     return;
/// }
/// ```
pub struct FilterEngine {
    rules: ArcSwap<RuleSet>,
    counters: Arc<DenialCounters>,
}

impl FilterEngine {
    /// 빈 규칙 세트로 엔진을 생성합니다. 규칙이 게시되기 전에는 모든 이벤트를 통과시킵니다.
    pub fn new(counters: Arc<DenialCounters>) -> Self {
        Self::with_rules(RuleSet::empty(), counters)
    }

    /// 초기 규칙 세트로 엔진을 생성합니다.
    pub fn with_rules(rule_set: RuleSet, counters: Arc<DenialCounters>) -> Self {
        gauge!(m::FILTER_RULES_LOADED).set(rule_set.len() as f64);
        Self {
            rules: ArcSwap::from_pointee(rule_set),
            counters,
        }
    }

    /// 이벤트의 통과/억제를 판정합니다.
    ///
    /// 메시지가 없으면 항상 통과입니다. 일치하는 첫 번째 규칙이 있으면 억제하고
    /// 이벤트 레벨의 카운터를 1 증가시킵니다.
    pub fn decide(&self, event: &LogEvent) -> Decision {
        counter!(m::FILTER_DECISIONS_TOTAL).increment(1);

        if event.message.is_none() {
            return Decision::Accept;
        }

        let rules = self.rules.load();
        match rules.first_match(event) {
            Some(_) => {
                self.counters.increment(event.level);
                Decision::Deny
            }
            None => Decision::Accept,
        }
    }

    /// 새 규칙 세트를 게시하고 이전 세트를 반환합니다.
    pub fn publish(&self, rule_set: RuleSet) -> Arc<RuleSet> {
        let count = rule_set.len();
        let previous = self.rules.swap(Arc::new(rule_set));
        gauge!(m::FILTER_RULES_LOADED).set(count as f64);
        tracing::debug!(
            previous = previous.len(),
            current = count,
            "published rule set"
        );
        previous
    }

    /// 현재 게시된 규칙 세트
    pub fn current(&self) -> Arc<RuleSet> {
        self.rules.load_full()
    }

    /// 현재 게시된 규칙 수
    pub fn rule_count(&self) -> usize {
        self.rules.load().len()
    }

    /// 억제 카운터
    pub fn counters(&self) -> &Arc<DenialCounters> {
        &self.counters
    }

    /// 0이 아닌 레벨의 억제 카운트 스냅샷
    pub fn denial_snapshot(&self) -> BTreeMap<Level, u64> {
        self.counters.snapshot()
    }
}

impl EventFilter for FilterEngine {
    fn name(&self) -> &str {
        "logsieve-filter"
    }

    fn decide(&self, event: &LogEvent) -> Decision {
        FilterEngine::decide(self, event)
    }
}

impl std::fmt::Debug for FilterEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FilterEngine")
            .field("rules", &self.rule_count())
            .field("denied", &self.counters.total())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rule::{LevelMode, Matcher, Rule};

    fn engine_with(rules: Vec<Rule>) -> FilterEngine {
        FilterEngine::with_rules(RuleSet::new(rules), Arc::new(DenialCounters::new()))
    }

    #[test]
    fn empty_engine_accepts_everything() {
        let engine = FilterEngine::new(Arc::new(DenialCounters::new()));
        assert_eq!(
            engine.decide(&LogEvent::new(Level::Fatal, "anything")),
            Decision::Accept
        );
        assert!(engine.denial_snapshot().is_empty());
    }

    #[test]
    fn matching_event_is_denied_and_counted() {
        let engine = engine_with(vec![Rule::new(Level::Info, Matcher::literal("filter"))]);
        let decision = engine.decide(&LogEvent::new(Level::Info, "please filter this"));
        assert_eq!(decision, Decision::Deny);
        assert_eq!(engine.counters().get(Level::Info), 1);
    }

    #[test]
    fn counter_uses_event_level_not_rule_level() {
        let engine = engine_with(vec![Rule::new(Level::Error, Matcher::literal("x"))]);
        assert!(engine.decide(&LogEvent::new(Level::Debug, "x")).is_deny());
        let snapshot = engine.denial_snapshot();
        assert_eq!(snapshot.get(&Level::Debug), Some(&1));
        assert_eq!(snapshot.get(&Level::Error), None);
    }

    #[test]
    fn event_without_message_is_accepted() {
        let engine = engine_with(vec![
            Rule::new(Level::Fatal, Matcher::literal("x")).with_stack_trace(true),
        ]);
        let event = LogEvent {
            level: Level::Info,
            message: None,
            stack_trace: Some(vec!["x".to_owned()]),
        };
        assert_eq!(engine.decide(&event), Decision::Accept);
        assert_eq!(engine.counters().total(), 0);
    }

    #[test]
    fn publish_replaces_rule_set() {
        let engine = engine_with(vec![Rule::new(Level::Info, Matcher::literal("old"))]);
        let previous = engine.publish(RuleSet::new(vec![
            Rule::new(Level::Info, Matcher::literal("new")),
            Rule::new(Level::Info, Matcher::literal("newer")),
        ]));

        assert_eq!(previous.len(), 1);
        assert_eq!(engine.rule_count(), 2);
        assert!(!engine.decide(&LogEvent::new(Level::Info, "old")).is_deny());
        assert!(engine.decide(&LogEvent::new(Level::Info, "new")).is_deny());
    }

    #[test]
    fn loaded_snapshot_survives_publish() {
        let engine = engine_with(vec![Rule::new(Level::Info, Matcher::literal("a"))]);
        let snapshot = engine.current();
        engine.publish(RuleSet::empty());
        assert_eq!(snapshot.len(), 1);
        assert_eq!(engine.rule_count(), 0);
    }

    #[test]
    fn equality_rule_through_engine() {
        let engine = engine_with(vec![
            Rule::new(Level::Info, Matcher::literal("x")).with_level_mode(LevelMode::Equality),
        ]);
        assert!(engine.decide(&LogEvent::new(Level::Info, "x")).is_deny());
        assert!(!engine.decide(&LogEvent::new(Level::Debug, "x")).is_deny());
    }

    #[test]
    fn engine_as_event_filter() {
        let engine: Arc<dyn EventFilter> = Arc::new(engine_with(vec![Rule::new(
            Level::Warn,
            Matcher::literal("noise"),
        )]));
        assert_eq!(engine.name(), "logsieve-filter");
        assert!(engine.decide(&LogEvent::new(Level::Info, "noise")).is_deny());
    }
}
