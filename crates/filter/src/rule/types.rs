//! 필터 규칙 데이터 타입
//!
//! 구조화 규칙 소스에서 역직렬화되는 레코드와 규칙 해석 옵션을 정의합니다.

use std::fmt;
use std::path::Path;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use logsieve_core::types::Level;

use crate::error::FilterError;

use super::Rule;
use super::matcher::Matcher;

/// 레벨 비교 모드
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LevelMode {
    /// 규칙 레벨과 이벤트 레벨이 정확히 같아야 함
    #[serde(rename = "equality", alias = "equal")]
    Equality,
    /// 규칙 레벨이 이벤트 레벨 이상이면 통과 (규칙 레벨 이하의 이벤트를 모두 억제)
    #[default]
    #[serde(rename = "threshold")]
    ThresholdAtOrAbove,
}

impl LevelMode {
    /// 규칙 레벨이 이벤트 레벨에 적용되는지 판정합니다.
    pub fn admits(&self, rule_level: Level, event_level: Level) -> bool {
        match self {
            Self::Equality => rule_level == event_level,
            Self::ThresholdAtOrAbove => rule_level >= event_level,
        }
    }

    /// 설정 파일 표기
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Equality => "equality",
            Self::ThresholdAtOrAbove => "threshold",
        }
    }
}

impl fmt::Display for LevelMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LevelMode {
    type Err = FilterError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "equality" | "equal" => Ok(Self::Equality),
            "threshold" => Ok(Self::ThresholdAtOrAbove),
            other => Err(FilterError::Config {
                field: "level_mode".to_owned(),
                reason: format!("unknown level mode '{other}', expected 'equality' or 'threshold'"),
            }),
        }
    }
}

/// legacy 라인 형식의 `level<sep>pattern` 구분자
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LegacySeparator {
    /// `WARN,pattern`
    #[default]
    Comma,
    /// `WARN pattern`
    Space,
}

impl LegacySeparator {
    /// 구분자 문자
    pub fn as_char(&self) -> char {
        match self {
            Self::Comma => ',',
            Self::Space => ' ',
        }
    }
}

impl FromStr for LegacySeparator {
    type Err = FilterError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "comma" | "," => Ok(Self::Comma),
            "space" | " " => Ok(Self::Space),
            other => Err(FilterError::Config {
                field: "legacy_separator".to_owned(),
                reason: format!("unknown separator '{other}', expected 'comma' or 'space'"),
            }),
        }
    }
}

/// 규칙 소스 형식
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceFormat {
    /// 레코드 목록 (`message`, `level`, `regex`, `checkStackTrace`)
    Structured,
    /// 한 줄에 하나씩 `level<sep>pattern`
    Lines,
}

impl SourceFormat {
    /// 확장자로 형식을 결정합니다. `.yml`/`.yaml`/`.json`은 구조화, 나머지는 라인 형식입니다.
    pub fn from_path(path: &Path) -> Self {
        let structured = path.extension().is_some_and(|ext| {
            ext.eq_ignore_ascii_case("yml")
                || ext.eq_ignore_ascii_case("yaml")
                || ext.eq_ignore_ascii_case("json")
        });
        if structured {
            Self::Structured
        } else {
            Self::Lines
        }
    }
}

/// 규칙 해석 옵션
///
/// 레코드가 직접 지정하지 않은 값의 기본값을 제공합니다.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ParseOptions {
    /// 레코드에 `levelMode`가 없을 때의 레벨 비교 모드
    pub default_level_mode: LevelMode,
    /// legacy 라인 구분자
    pub legacy_separator: LegacySeparator,
    /// legacy 라인 규칙의 스택 트레이스 검사 여부
    pub legacy_check_stack_trace: bool,
}

/// 구조화 소스의 원시 규칙 레코드
///
/// # YAML 스키마
/// ```yaml
/// - message: "filter this"
///   level: INFO
/// - message: "^Connection reset.*"
///   level: WARN
///   regex: true
///   checkStackTrace: true
///   levelMode: equality
/// ```
///
/// `level`과 `message`는 필수지만 누락 시 레코드 단위 에러로 보고하기 위해
/// `Option`으로 받습니다.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawRuleRecord {
    /// 레벨 이름
    pub level: Option<String>,
    /// 리터럴 텍스트 또는 정규식
    pub message: Option<String>,
    /// `message`를 전체 일치 정규식으로 취급
    #[serde(default)]
    pub regex: bool,
    /// 메시지 불일치 시 스택 트레이스 라인도 검사
    #[serde(default, alias = "check_stack_trace")]
    pub check_stack_trace: bool,
    /// 레벨 비교 모드 (없으면 설정 기본값)
    #[serde(default, alias = "level_mode")]
    pub level_mode: Option<LevelMode>,
}

impl RawRuleRecord {
    /// 레코드를 검증하고 [`Rule`]로 변환합니다.
    pub fn into_rule(self, origin: &str, options: &ParseOptions) -> Result<Rule, FilterError> {
        let parse_error = |reason: String| FilterError::RuleParse {
            origin: origin.to_owned(),
            reason,
        };

        let level_name = self
            .level
            .ok_or_else(|| parse_error("missing required field `level`".to_owned()))?;
        let message = self
            .message
            .ok_or_else(|| parse_error("missing required field `message`".to_owned()))?;

        let level: Level = level_name
            .parse()
            .map_err(|e: logsieve_core::types::UnknownLevel| parse_error(e.to_string()))?;

        if message.is_empty() {
            return Err(parse_error("`message` must not be empty".to_owned()));
        }

        let matcher = if self.regex {
            Matcher::regex(&message).map_err(|e| parse_error(format!("invalid regex: {e}")))?
        } else {
            Matcher::literal(message)
        };

        Ok(Rule::new(level, matcher)
            .with_level_mode(self.level_mode.unwrap_or(options.default_level_mode))
            .with_stack_trace(self.check_stack_trace))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(level: Option<&str>, message: Option<&str>) -> RawRuleRecord {
        RawRuleRecord {
            level: level.map(str::to_owned),
            message: message.map(str::to_owned),
            ..Default::default()
        }
    }

    #[test]
    fn threshold_admits_events_at_or_below_rule_level() {
        let mode = LevelMode::ThresholdAtOrAbove;
        assert!(mode.admits(Level::Warn, Level::Warn));
        assert!(mode.admits(Level::Warn, Level::Info));
        assert!(mode.admits(Level::Warn, Level::Trace));
        assert!(!mode.admits(Level::Warn, Level::Error));
    }

    #[test]
    fn equality_admits_only_same_level() {
        let mode = LevelMode::Equality;
        assert!(mode.admits(Level::Info, Level::Info));
        assert!(!mode.admits(Level::Info, Level::Debug));
        assert!(!mode.admits(Level::Info, Level::Warn));
    }

    #[test]
    fn level_mode_default_is_threshold() {
        assert_eq!(LevelMode::default(), LevelMode::ThresholdAtOrAbove);
    }

    #[test]
    fn level_mode_from_str() {
        assert_eq!("Equality".parse::<LevelMode>().unwrap(), LevelMode::Equality);
        assert_eq!(
            "threshold".parse::<LevelMode>().unwrap(),
            LevelMode::ThresholdAtOrAbove
        );
        assert!("ceiling".parse::<LevelMode>().is_err());
    }

    #[test]
    fn separator_from_str() {
        assert_eq!("comma".parse::<LegacySeparator>().unwrap(), LegacySeparator::Comma);
        assert_eq!("space".parse::<LegacySeparator>().unwrap().as_char(), ' ');
        assert!("tab".parse::<LegacySeparator>().is_err());
    }

    #[test]
    fn source_format_by_extension() {
        assert_eq!(
            SourceFormat::from_path(Path::new("/etc/logsieve/filters.yml")),
            SourceFormat::Structured
        );
        assert_eq!(
            SourceFormat::from_path(Path::new("rules.YAML")),
            SourceFormat::Structured
        );
        assert_eq!(
            SourceFormat::from_path(Path::new("rules.json")),
            SourceFormat::Structured
        );
        assert_eq!(
            SourceFormat::from_path(Path::new("legacy.txt")),
            SourceFormat::Lines
        );
        assert_eq!(SourceFormat::from_path(Path::new("legacy")), SourceFormat::Lines);
    }

    #[test]
    fn record_into_literal_rule() {
        let rule = record(Some("info"), Some("filter this"))
            .into_rule("test.yml#1", &ParseOptions::default())
            .unwrap();
        assert_eq!(rule.level, Level::Info);
        assert!(!rule.matcher.is_regex());
        assert!(!rule.check_stack_trace);
        assert_eq!(rule.level_mode, LevelMode::ThresholdAtOrAbove);
    }

    #[test]
    fn record_level_mode_overrides_default() {
        let mut raw = record(Some("WARN"), Some("x"));
        raw.level_mode = Some(LevelMode::Equality);
        let rule = raw.into_rule("test.yml#1", &ParseOptions::default()).unwrap();
        assert_eq!(rule.level_mode, LevelMode::Equality);
    }

    #[test]
    fn record_missing_level_fails() {
        let err = record(None, Some("x"))
            .into_rule("test.yml#2", &ParseOptions::default())
            .unwrap_err();
        assert!(matches!(err, FilterError::RuleParse { .. }));
        assert!(err.to_string().contains("level"));
        assert!(err.to_string().contains("test.yml#2"));
    }

    #[test]
    fn record_missing_message_fails() {
        let err = record(Some("INFO"), None)
            .into_rule("test.yml#3", &ParseOptions::default())
            .unwrap_err();
        assert!(err.to_string().contains("message"));
    }

    #[test]
    fn record_unknown_level_fails() {
        let err = record(Some("LOUD"), Some("x"))
            .into_rule("test.yml#1", &ParseOptions::default())
            .unwrap_err();
        assert!(err.to_string().contains("LOUD"));
    }

    #[test]
    fn record_empty_message_fails() {
        assert!(
            record(Some("INFO"), Some(""))
                .into_rule("test.yml#1", &ParseOptions::default())
                .is_err()
        );
    }

    #[test]
    fn record_invalid_regex_fails() {
        let mut raw = record(Some("INFO"), Some("[unclosed"));
        raw.regex = true;
        let err = raw
            .into_rule("test.yml#1", &ParseOptions::default())
            .unwrap_err();
        assert!(err.to_string().contains("invalid regex"));
    }

    #[test]
    fn record_from_yaml_uses_camel_case_fields() {
        let yaml = r#"
message: "^filter$"
level: ERROR
regex: true
checkStackTrace: true
levelMode: equality
"#;
        let raw: RawRuleRecord = serde_yaml::from_str(yaml).unwrap();
        assert!(raw.regex);
        assert!(raw.check_stack_trace);
        assert_eq!(raw.level_mode, Some(LevelMode::Equality));
    }
}
