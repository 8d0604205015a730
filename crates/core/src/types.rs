//! 도메인 타입 -- 시스템 전역에서 사용되는 공통 타입
//!
//! 필터 엔진과 호스트(데몬)가 공유하는 로그 이벤트 모델을 정의합니다.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// 로그 심각도 레벨
///
/// `Ord` 구현으로 레벨 비교가 가능합니다
/// (`Trace < Debug < Info < Warn < Error < Fatal`).
/// threshold 모드의 레벨 비교가 이 순서에 의존합니다.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(try_from = "String", into = "String")]
pub enum Level {
    /// 가장 상세한 추적 로그
    Trace,
    /// 디버그 로그
    Debug,
    /// 일반 정보
    #[default]
    Info,
    /// 경고
    Warn,
    /// 에러
    Error,
    /// 치명적 에러
    Fatal,
}

impl Level {
    /// 레벨 개수
    pub const COUNT: usize = 6;

    /// 낮은 레벨부터 모든 레벨
    pub const ALL: [Level; Level::COUNT] = [
        Level::Trace,
        Level::Debug,
        Level::Info,
        Level::Warn,
        Level::Error,
        Level::Fatal,
    ];

    /// 대문자 레벨 이름을 반환합니다.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Trace => "TRACE",
            Self::Debug => "DEBUG",
            Self::Info => "INFO",
            Self::Warn => "WARN",
            Self::Error => "ERROR",
            Self::Fatal => "FATAL",
        }
    }

    /// `ALL` 배열에서의 위치 (카운터 슬롯 인덱스로 사용)
    pub fn index(&self) -> usize {
        *self as usize
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 알 수 없는 레벨 이름
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown level name '{0}'")]
pub struct UnknownLevel(pub String);

impl FromStr for Level {
    type Err = UnknownLevel;

    /// 대소문자를 구분하지 않고 파싱합니다. `WARNING`은 `WARN`의 별칭입니다.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "TRACE" => Ok(Self::Trace),
            "DEBUG" => Ok(Self::Debug),
            "INFO" => Ok(Self::Info),
            "WARN" | "WARNING" => Ok(Self::Warn),
            "ERROR" => Ok(Self::Error),
            "FATAL" => Ok(Self::Fatal),
            _ => Err(UnknownLevel(s.to_owned())),
        }
    }
}

impl TryFrom<String> for Level {
    type Error = UnknownLevel;

    fn try_from(value: String) -> Result<Self, UnknownLevel> {
        value.parse()
    }
}

impl From<Level> for String {
    fn from(level: Level) -> Self {
        level.as_str().to_owned()
    }
}

/// 로그 이벤트
///
/// 호스트 로깅 프레임워크가 필터에 넘기는 이벤트입니다.
/// 필터는 이벤트를 소유하지 않고 읽기만 합니다.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogEvent {
    /// 심각도
    pub level: Level,
    /// 렌더링된 메시지 (없으면 어떤 규칙도 적용되지 않음)
    #[serde(default)]
    pub message: Option<String>,
    /// 예외 스택 트레이스 (한 줄씩)
    #[serde(default, alias = "stackTrace")]
    pub stack_trace: Option<Vec<String>>,
}

impl LogEvent {
    /// 메시지만 가진 이벤트를 생성합니다.
    pub fn new(level: Level, message: impl Into<String>) -> Self {
        Self {
            level,
            message: Some(message.into()),
            stack_trace: None,
        }
    }

    /// 스택 트레이스를 추가합니다.
    pub fn with_stack_trace<I, S>(mut self, lines: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.stack_trace = Some(lines.into_iter().map(Into::into).collect());
        self
    }
}

impl fmt::Display for LogEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{}] {}",
            self.level,
            self.message.as_deref().unwrap_or("<no message>")
        )
    }
}

/// 필터 판정 결과
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Decision {
    /// 통과 (호스트가 이벤트를 계속 전달)
    Accept,
    /// 억제 (이벤트 폐기)
    Deny,
}

impl Decision {
    /// 억제 여부
    pub fn is_deny(&self) -> bool {
        matches!(self, Self::Deny)
    }
}

impl fmt::Display for Decision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Accept => f.write_str("accept"),
            Self::Deny => f.write_str("deny"),
        }
    }
}
