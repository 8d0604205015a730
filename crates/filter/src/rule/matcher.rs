//! 규칙 매칭 로직 -- 리터럴 부분 문자열 및 전체 일치 정규식
//!
//! [`Matcher`]는 규칙 로딩 시 한 번만 구성되며 이후 불변입니다.
//! 정규식은 로딩 시 미리 컴파일하여 매칭 시 재컴파일 오버헤드를 제거합니다.

use std::fmt;

use regex::{Regex, RegexBuilder};

use crate::error::FilterError;

/// 컴파일된 정규식 프로그램 크기 제한
const REGEX_SIZE_LIMIT: usize = 1 << 20;

/// 규칙 매처
#[derive(Clone)]
pub enum Matcher {
    /// 후보 문자열이 텍스트를 포함하면 일치
    Literal(String),
    /// 후보 문자열 전체가 패턴과 일치해야 함
    Regex {
        /// 사용자가 작성한 원본 패턴
        pattern: String,
        /// `^(?:pattern)$`로 고정된 컴파일 결과
        compiled: Regex,
    },
}

impl Matcher {
    /// 리터럴 매처를 생성합니다.
    pub fn literal(text: impl Into<String>) -> Self {
        Self::Literal(text.into())
    }

    /// 전체 일치 정규식 매처를 생성합니다.
    ///
    /// # Errors
    /// 패턴 문법이 잘못되었거나 컴파일 크기 제한을 초과하면 에러를 반환합니다.
    pub fn regex(pattern: &str) -> Result<Self, FilterError> {
        // 원본 패턴 단독 검증: `a)|(b` 같은 패턴이 앵커 그룹으로 감싸져 통과하는 것을 막음
        build(pattern)?;
        let compiled = build(&format!("^(?:{pattern})$"))?;
        Ok(Self::Regex {
            pattern: pattern.to_owned(),
            compiled,
        })
    }

    /// 후보 문자열이 일치하는지 판정합니다.
    pub fn matches(&self, candidate: &str) -> bool {
        match self {
            Self::Literal(text) => candidate.contains(text.as_str()),
            Self::Regex { compiled, .. } => compiled.is_match(candidate),
        }
    }

    /// 원본 텍스트 또는 패턴
    pub fn pattern(&self) -> &str {
        match self {
            Self::Literal(text) => text,
            Self::Regex { pattern, .. } => pattern,
        }
    }

    /// 정규식 매처 여부
    pub fn is_regex(&self) -> bool {
        matches!(self, Self::Regex { .. })
    }
}

fn build(pattern: &str) -> Result<Regex, FilterError> {
    Ok(RegexBuilder::new(pattern)
        .size_limit(REGEX_SIZE_LIMIT)
        .build()?)
}

impl fmt::Debug for Matcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Literal(text) => f.debug_tuple("Literal").field(text).finish(),
            Self::Regex { pattern, .. } => f.debug_tuple("Regex").field(pattern).finish(),
        }
    }
}

impl fmt::Display for Matcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Literal(text) => write!(f, "contains {text:?}"),
            Self::Regex { pattern, .. } => write!(f, "matches /{pattern}/"),
        }
    }
}

impl PartialEq for Matcher {
    fn eq(&self, other: &Self) -> bool {
        self.is_regex() == other.is_regex() && self.pattern() == other.pattern()
    }
}

impl Eq for Matcher {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn literal_matches_substring() {
        let m = Matcher::literal("filter");
        assert!(m.matches("please filter this"));
        assert!(m.matches("filter"));
        assert!(!m.matches("Filter"));
        assert!(!m.matches("filtre"));
    }

    #[test]
    fn regex_requires_full_match() {
        let m = Matcher::regex("filter").unwrap();
        assert!(m.matches("filter"));
        assert!(!m.matches("please filter this"));

        let m = Matcher::regex(".*filter.*").unwrap();
        assert!(m.matches("please filter this"));
    }

    #[test]
    fn regex_with_explicit_anchors() {
        let m = Matcher::regex("^filter$").unwrap();
        assert!(m.matches("filter"));
        assert!(!m.matches("filter!"));
    }

    #[test]
    fn regex_alternation_stays_anchored() {
        let m = Matcher::regex("foo|bar").unwrap();
        assert!(m.matches("foo"));
        assert!(m.matches("bar"));
        assert!(!m.matches("foobar!"));
        assert!(!m.matches("xbar"));
    }

    #[test]
    fn invalid_regex_is_rejected() {
        assert!(Matcher::regex("[unclosed").is_err());
        assert!(Matcher::regex("a)|(b").is_err());
    }

    #[test]
    fn regex_containing_comma() {
        let m = Matcher::regex(r"a{1,3}b").unwrap();
        assert!(m.matches("aab"));
        assert!(!m.matches("aaaab"));
    }

    #[test]
    fn large_candidate_is_matched_in_full() {
        let mut huge = String::from("please filter this now ");
        huge.push_str(&"x".repeat(2 * 1024 * 1024));

        assert!(Matcher::literal("filter this").matches(&huge));
        assert!(Matcher::regex(".*filter this.*").unwrap().matches(&huge));
        assert!(!Matcher::regex("filter this").unwrap().matches(&huge));
    }

    #[test]
    fn pattern_and_display() {
        let m = Matcher::regex("a.*").unwrap();
        assert_eq!(m.pattern(), "a.*");
        assert!(m.is_regex());
        assert_eq!(m.to_string(), "matches /a.*/");
        assert_eq!(Matcher::literal("x").to_string(), "contains \"x\"");
    }

    #[test]
    fn equality_compares_kind_and_pattern() {
        assert_eq!(Matcher::literal("a"), Matcher::literal("a"));
        assert_ne!(Matcher::literal("a"), Matcher::regex("a").unwrap());
    }
}
