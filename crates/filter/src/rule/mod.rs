//! 필터 규칙 -- 규칙 정의, 불변 규칙 세트, 소스 로딩
//!
//! # 규칙 형식
//!
//! 구조화 소스 (`.yml`, `.yaml`, `.json`):
//! ```yaml
//! filters:
//!   - message: "filter this"
//!     level: INFO
//!   - message: "^Connection reset.*"
//!     level: WARN
//!     regex: true
//!     checkStackTrace: true
//! ```
//!
//! 라인 소스 (그 외 확장자):
//! ```text
//! # level,pattern
//! WARN,^Connection reset.*
//! INFO,.*heartbeat.*
//! ```
//!
//! # 아키텍처
//! - [`Rule`]: 레벨 조건 + 매처 + 스택 트레이스 검사 여부
//! - [`RuleSet`]: 순서가 있는 불변 규칙 목록, 첫 일치 규칙이 판정을 결정
//! - [`loader`]: 소스 읽기 및 형식별 파싱
//! - [`matcher`]: 리터럴/정규식 매칭
//! - [`types`]: 레벨 모드, 원시 레코드, 파싱 옵션

pub mod loader;
pub mod matcher;
pub mod types;

pub use loader::{LoadReport, ParsedSource, RuleLoader, SourceOutcome, SourceReport};
pub use matcher::Matcher;
pub use types::{LegacySeparator, LevelMode, ParseOptions, RawRuleRecord, SourceFormat};

use std::fmt;
use std::time::SystemTime;

use logsieve_core::types::{Level, LogEvent};

/// 필터 규칙
///
/// 로딩 후에는 변경되지 않습니다.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rule {
    /// 규칙 레벨
    pub level: Level,
    /// 레벨 비교 모드
    pub level_mode: LevelMode,
    /// 메시지 매처
    pub matcher: Matcher,
    /// 메시지 불일치 시 스택 트레이스 라인 검사 여부
    pub check_stack_trace: bool,
}

impl Rule {
    /// threshold 모드, 스택 트레이스 미검사 규칙을 생성합니다.
    pub fn new(level: Level, matcher: Matcher) -> Self {
        Self {
            level,
            level_mode: LevelMode::default(),
            matcher,
            check_stack_trace: false,
        }
    }

    /// 레벨 비교 모드를 설정합니다.
    pub fn with_level_mode(mut self, mode: LevelMode) -> Self {
        self.level_mode = mode;
        self
    }

    /// 스택 트레이스 검사 여부를 설정합니다.
    pub fn with_stack_trace(mut self, check: bool) -> Self {
        self.check_stack_trace = check;
        self
    }

    /// 이벤트 레벨이 이 규칙의 레벨 조건을 만족하는지 판정합니다.
    pub fn level_matches(&self, event_level: Level) -> bool {
        self.level_mode.admits(self.level, event_level)
    }

    /// 규칙을 이벤트에 평가합니다.
    ///
    /// 메시지가 없으면 불일치입니다. 메시지가 일치하지 않고
    /// `check_stack_trace`가 켜져 있으면 스택 트레이스 라인을 순서대로 검사합니다.
    /// 후보 길이에 제한은 없습니다.
    pub fn evaluate(&self, event: &LogEvent) -> bool {
        let Some(message) = event.message.as_deref() else {
            return false;
        };

        if !self.level_matches(event.level) {
            return false;
        }

        if self.matcher.matches(message) {
            return true;
        }

        self.check_stack_trace
            && event
                .stack_trace
                .iter()
                .flatten()
                .any(|line| self.matcher.matches(line))
    }
}

impl fmt::Display for Rule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({}) {}", self.level, self.level_mode, self.matcher)?;
        if self.check_stack_trace {
            f.write_str(" +stacktrace")?;
        }
        Ok(())
    }
}

/// 불변 규칙 세트
///
/// 소스 목록 순서, 소스 내 레코드 순서를 유지합니다.
/// 게시된 후에는 수정되지 않으며 교체만 가능합니다.
#[derive(Debug, Clone)]
pub struct RuleSet {
    rules: Vec<Rule>,
    loaded_at: SystemTime,
}

impl RuleSet {
    /// 규칙 목록으로 세트를 생성합니다.
    pub fn new(rules: Vec<Rule>) -> Self {
        Self {
            rules,
            loaded_at: SystemTime::now(),
        }
    }

    /// 빈 규칙 세트
    pub fn empty() -> Self {
        Self::new(Vec::new())
    }

    /// 규칙 목록
    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }

    /// 규칙 수
    pub fn len(&self) -> usize {
        self.rules.len()
    }

    /// 규칙이 없는지 여부
    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// 세트 생성 시각
    pub fn loaded_at(&self) -> SystemTime {
        self.loaded_at
    }

    /// 이벤트에 일치하는 첫 번째 규칙을 찾습니다.
    ///
    /// 일치하는 규칙이 나오면 이후 규칙은 평가하지 않습니다.
    pub fn first_match(&self, event: &LogEvent) -> Option<&Rule> {
        event.message.as_ref()?;

        self.rules.iter().find(|rule| rule.evaluate(event))
    }
}

impl Default for RuleSet {
    fn default() -> Self {
        Self::empty()
    }
}

impl FromIterator<Rule> for RuleSet {
    fn from_iter<I: IntoIterator<Item = Rule>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}
