//! 필터 엔진 설정
//!
//! [`FilterConfig`]는 core의 [`FilterSection`](logsieve_core::config::FilterSection)을
//! 기반으로 문자열 설정값을 타입이 있는 값으로 변환한 필터 전용 설정을 제공합니다.
//!
//! # 사용 예시
//! ```ignore
//! use logsieve_core::config::LogsieveConfig;
//! use logsieve_filter::config::FilterConfig;
//!
//! let core_config = LogsieveConfig::default();
//! let config = FilterConfig::from_core(&core_config.filter)?;
//! ```

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::FilterError;
use crate::rule::loader::{MAX_SOURCE_BYTES, RuleLoader};
use crate::rule::types::{LegacySeparator, LevelMode, ParseOptions};

/// 리로드 결과가 비었을 때의 게시 정책
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EmptyReloadPolicy {
    /// 소스 실패로 규칙이 0개가 되면 이전 세트를 유지 (기본값)
    #[default]
    #[serde(rename = "retain")]
    RetainPrevious,
    /// 결과와 무관하게 항상 새 세트를 게시
    Replace,
}

impl std::str::FromStr for EmptyReloadPolicy {
    type Err = FilterError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "retain" => Ok(Self::RetainPrevious),
            "replace" => Ok(Self::Replace),
            other => Err(FilterError::Config {
                field: "empty_reload_policy".to_owned(),
                reason: format!("unknown policy '{other}', expected 'retain' or 'replace'"),
            }),
        }
    }
}

/// 필터 엔진 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FilterConfig {
    /// 규칙 소스 경로 (순서대로 로드)
    pub sources: Vec<String>,
    /// 리로드 주기 (초)
    pub refresh_interval_secs: u64,
    /// 기본 레벨 비교 모드
    pub level_mode: LevelMode,
    /// legacy 라인 구분자
    pub legacy_separator: LegacySeparator,
    /// legacy 라인 규칙의 스택 트레이스 검사 여부
    pub legacy_check_stack_trace: bool,
    /// 빈 리로드 결과 처리 정책
    pub empty_reload_policy: EmptyReloadPolicy,
    /// 소스 읽기 타임아웃 (초)
    pub source_read_timeout_secs: u64,

    // --- 확장 설정 (core에 없는 추가 필드) ---
    /// 소스 하나의 최대 크기 (바이트)
    pub max_source_bytes: u64,
}

impl Default for FilterConfig {
    fn default() -> Self {
        Self {
            sources: Vec::new(),
            refresh_interval_secs: 300,
            level_mode: LevelMode::ThresholdAtOrAbove,
            legacy_separator: LegacySeparator::Comma,
            legacy_check_stack_trace: true,
            empty_reload_policy: EmptyReloadPolicy::RetainPrevious,
            source_read_timeout_secs: 10,
            max_source_bytes: MAX_SOURCE_BYTES,
        }
    }
}

impl FilterConfig {
    /// core의 `FilterSection`에서 필터 설정을 생성합니다.
    ///
    /// # Errors
    /// 열거형 문자열 값을 해석할 수 없으면 에러를 반환합니다.
    pub fn from_core(core: &logsieve_core::config::FilterSection) -> Result<Self, FilterError> {
        Ok(Self {
            sources: core.sources.clone(),
            refresh_interval_secs: core.refresh_interval_secs,
            level_mode: core.level_mode.parse()?,
            legacy_separator: core.legacy_separator.parse()?,
            legacy_check_stack_trace: core.legacy_check_stack_trace,
            empty_reload_policy: core.empty_reload_policy.parse()?,
            source_read_timeout_secs: core.source_read_timeout_secs,
            ..Self::default()
        })
    }

    /// 설정값의 유효성을 검증합니다.
    pub fn validate(&self) -> Result<(), FilterError> {
        const MAX_REFRESH_INTERVAL_SECS: u64 = 86_400; // 1 day
        const MAX_READ_TIMEOUT_SECS: u64 = 300;

        if self.refresh_interval_secs == 0 || self.refresh_interval_secs > MAX_REFRESH_INTERVAL_SECS
        {
            return Err(FilterError::Config {
                field: "refresh_interval_secs".to_owned(),
                reason: format!("must be 1-{MAX_REFRESH_INTERVAL_SECS}"),
            });
        }

        if self.source_read_timeout_secs == 0 || self.source_read_timeout_secs > MAX_READ_TIMEOUT_SECS
        {
            return Err(FilterError::Config {
                field: "source_read_timeout_secs".to_owned(),
                reason: format!("must be 1-{MAX_READ_TIMEOUT_SECS}"),
            });
        }

        if self.max_source_bytes == 0 || self.max_source_bytes > MAX_SOURCE_BYTES {
            return Err(FilterError::Config {
                field: "max_source_bytes".to_owned(),
                reason: format!("must be 1-{MAX_SOURCE_BYTES}"),
            });
        }

        if let Some(idx) = self.sources.iter().position(|s| s.trim().is_empty()) {
            return Err(FilterError::Config {
                field: "sources".to_owned(),
                reason: format!("source #{} must not be empty", idx + 1),
            });
        }

        Ok(())
    }

    /// 리로드 주기
    pub fn refresh_interval(&self) -> Duration {
        Duration::from_secs(self.refresh_interval_secs)
    }

    /// 소스 읽기 타임아웃
    pub fn read_timeout(&self) -> Duration {
        Duration::from_secs(self.source_read_timeout_secs)
    }

    /// 규칙 해석 옵션
    pub fn parse_options(&self) -> ParseOptions {
        ParseOptions {
            default_level_mode: self.level_mode,
            legacy_separator: self.legacy_separator,
            legacy_check_stack_trace: self.legacy_check_stack_trace,
        }
    }

    /// 이 설정으로 규칙 로더를 생성합니다.
    pub fn rule_loader(&self) -> RuleLoader {
        let sources = self.sources.iter().map(PathBuf::from).collect();
        RuleLoader::new(sources, self.parse_options())
            .with_read_timeout(self.read_timeout())
            .with_max_source_bytes(self.max_source_bytes)
    }
}

/// 필터 설정 빌더
#[derive(Default)]
pub struct FilterConfigBuilder {
    config: FilterConfig,
}

impl FilterConfigBuilder {
    /// 새 빌더를 생성합니다.
    pub fn new() -> Self {
        Self::default()
    }

    /// 규칙 소스를 설정합니다.
    pub fn sources(mut self, sources: Vec<String>) -> Self {
        self.config.sources = sources;
        self
    }

    /// 규칙 소스를 하나 추가합니다.
    pub fn source(mut self, source: impl Into<String>) -> Self {
        self.config.sources.push(source.into());
        self
    }

    /// 리로드 주기(초)를 설정합니다.
    pub fn refresh_interval_secs(mut self, secs: u64) -> Self {
        self.config.refresh_interval_secs = secs;
        self
    }

    /// 기본 레벨 비교 모드를 설정합니다.
    pub fn level_mode(mut self, mode: LevelMode) -> Self {
        self.config.level_mode = mode;
        self
    }

    /// legacy 라인 구분자를 설정합니다.
    pub fn legacy_separator(mut self, separator: LegacySeparator) -> Self {
        self.config.legacy_separator = separator;
        self
    }

    /// legacy 라인 규칙의 스택 트레이스 검사 여부를 설정합니다.
    pub fn legacy_check_stack_trace(mut self, check: bool) -> Self {
        self.config.legacy_check_stack_trace = check;
        self
    }

    /// 빈 리로드 정책을 설정합니다.
    pub fn empty_reload_policy(mut self, policy: EmptyReloadPolicy) -> Self {
        self.config.empty_reload_policy = policy;
        self
    }

    /// 소스 읽기 타임아웃(초)을 설정합니다.
    pub fn source_read_timeout_secs(mut self, secs: u64) -> Self {
        self.config.source_read_timeout_secs = secs;
        self
    }

    /// 소스 최대 크기를 설정합니다.
    pub fn max_source_bytes(mut self, bytes: u64) -> Self {
        self.config.max_source_bytes = bytes;
        self
    }

    /// 설정을 검증하고 `FilterConfig`를 생성합니다.
    pub fn build(self) -> Result<FilterConfig, FilterError> {
        self.config.validate()?;
        Ok(self.config)
    }
}
