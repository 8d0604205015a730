//! 설정 관리 -- logsieve.toml 파싱 및 런타임 설정
//!
//! [`LogsieveConfig`]는 모든 구성 요소의 설정을 담는 최상위 구조체입니다.
//!
//! # 설정 로딩 우선순위
//! 1. CLI 인자 (최고 우선)
//! 2. 환경변수 (`LOGSIEVE_FILTER_SOURCES=a.yml,b.txt` 형식)
//! 3. 설정 파일 (`logsieve.toml`)
//! 4. 기본값 (`Default` 구현)
//!
//! # 사용 예시
//! ```no_run
//! # async fn example() -> Result<(), logsieve_core::error::LogsieveError> {
//! use logsieve_core::config::LogsieveConfig;
//!
//! // 파일에서 로드 + 환경변수 오버라이드
//! let config = LogsieveConfig::load("logsieve.toml").await?;
//!
//! // TOML 문자열에서 직접 파싱
//! let config = LogsieveConfig::parse("[filter]\nsources = [\"/etc/logsieve/filters.yml\"]")?;
//! # Ok(())
//! # }
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::{ConfigError, LogsieveError};

/// 허용되는 레벨 비교 모드
pub const LEVEL_MODES: [&str; 2] = ["equality", "threshold"];

/// 허용되는 legacy 라인 구분자
pub const LEGACY_SEPARATORS: [&str; 2] = ["comma", "space"];

/// 허용되는 빈 리로드 정책
pub const EMPTY_RELOAD_POLICIES: [&str; 2] = ["retain", "replace"];

/// logsieve 통합 설정
///
/// `logsieve.toml` 파일의 최상위 구조를 나타냅니다.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LogsieveConfig {
    /// 일반 설정
    #[serde(default)]
    pub general: GeneralConfig,
    /// 필터 엔진 설정
    #[serde(default)]
    pub filter: FilterSection,
    /// 메트릭 노출 설정
    #[serde(default)]
    pub metrics: MetricsConfig,
}

impl LogsieveConfig {
    /// TOML 파일에서 설정을 로드하고 환경변수 오버라이드를 적용합니다.
    pub async fn load(path: impl AsRef<Path>) -> Result<Self, LogsieveError> {
        let mut config = Self::from_file(path).await?;
        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    /// TOML 파일에서 설정을 로드합니다 (환경변수 오버라이드 없음).
    pub async fn from_file(path: impl AsRef<Path>) -> Result<Self, LogsieveError> {
        let path = path.as_ref();
        let content = tokio::fs::read_to_string(path).await.map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                LogsieveError::Config(ConfigError::FileNotFound {
                    path: path.display().to_string(),
                })
            } else {
                LogsieveError::Io(e)
            }
        })?;
        let config = Self::parse(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// TOML 문자열에서 설정을 파싱합니다.
    pub fn parse(toml_str: &str) -> Result<Self, LogsieveError> {
        toml::from_str(toml_str).map_err(|e| {
            LogsieveError::Config(ConfigError::ParseFailed {
                reason: e.to_string(),
            })
        })
    }

    /// 환경변수로 설정값을 오버라이드합니다.
    ///
    /// 환경변수 네이밍 규칙: `LOGSIEVE_{SECTION}_{FIELD}`
    /// 예: `LOGSIEVE_FILTER_REFRESH_INTERVAL_SECS=60`
    pub fn apply_env_overrides(&mut self) {
        // General
        override_string(&mut self.general.log_level, "LOGSIEVE_GENERAL_LOG_LEVEL");
        override_string(&mut self.general.log_format, "LOGSIEVE_GENERAL_LOG_FORMAT");

        // Filter
        override_csv(&mut self.filter.sources, "LOGSIEVE_FILTER_SOURCES");
        override_u64(
            &mut self.filter.refresh_interval_secs,
            "LOGSIEVE_FILTER_REFRESH_INTERVAL_SECS",
        );
        override_string(&mut self.filter.level_mode, "LOGSIEVE_FILTER_LEVEL_MODE");
        override_string(
            &mut self.filter.legacy_separator,
            "LOGSIEVE_FILTER_LEGACY_SEPARATOR",
        );
        override_bool(
            &mut self.filter.legacy_check_stack_trace,
            "LOGSIEVE_FILTER_LEGACY_CHECK_STACK_TRACE",
        );
        override_string(
            &mut self.filter.empty_reload_policy,
            "LOGSIEVE_FILTER_EMPTY_RELOAD_POLICY",
        );
        override_u64(
            &mut self.filter.source_read_timeout_secs,
            "LOGSIEVE_FILTER_SOURCE_READ_TIMEOUT_SECS",
        );

        // Metrics
        override_bool(&mut self.metrics.enabled, "LOGSIEVE_METRICS_ENABLED");
        override_string(&mut self.metrics.listen_addr, "LOGSIEVE_METRICS_LISTEN_ADDR");
        override_u16(&mut self.metrics.port, "LOGSIEVE_METRICS_PORT");
    }

    /// 설정값의 유효성을 검증합니다.
    pub fn validate(&self) -> Result<(), LogsieveError> {
        // log_level 검증
        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_levels.contains(&self.general.log_level.as_str()) {
            return Err(ConfigError::InvalidValue {
                field: "general.log_level".to_owned(),
                reason: format!("must be one of: {}", valid_levels.join(", ")),
            }
            .into());
        }

        // log_format 검증
        let valid_formats = ["json", "pretty"];
        if !valid_formats.contains(&self.general.log_format.as_str()) {
            return Err(ConfigError::InvalidValue {
                field: "general.log_format".to_owned(),
                reason: format!("must be one of: {}", valid_formats.join(", ")),
            }
            .into());
        }

        self.filter.validate()?;

        if self.metrics.enabled && self.metrics.port == 0 {
            return Err(ConfigError::InvalidValue {
                field: "metrics.port".to_owned(),
                reason: "port must not be 0 when metrics are enabled".to_owned(),
            }
            .into());
        }

        Ok(())
    }
}

/// 일반 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// 로그 레벨 (trace, debug, info, warn, error)
    pub log_level: String,
    /// 로그 형식 (json, pretty)
    pub log_format: String,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_owned(),
            log_format: "json".to_owned(),
        }
    }
}

/// 필터 엔진 설정 (`[filter]` 섹션)
///
/// 열거형 값은 문자열로 보관하고 [`FilterSection::validate`]에서 검증합니다.
/// 필터 크레이트가 이 섹션에서 타입이 있는 설정을 파생합니다.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FilterSection {
    /// 규칙 소스 파일 경로 (순서대로 로드)
    pub sources: Vec<String>,
    /// 규칙 리로드 주기 (초)
    pub refresh_interval_secs: u64,
    /// 기본 레벨 비교 모드 (equality, threshold)
    pub level_mode: String,
    /// legacy 라인 형식의 구분자 (comma, space)
    pub legacy_separator: String,
    /// legacy 라인 규칙의 스택 트레이스 검사 여부
    pub legacy_check_stack_trace: bool,
    /// 리로드 결과가 비었을 때의 정책 (retain, replace)
    pub empty_reload_policy: String,
    /// 소스 하나를 읽는 최대 시간 (초)
    pub source_read_timeout_secs: u64,
}

impl Default for FilterSection {
    fn default() -> Self {
        Self {
            sources: Vec::new(),
            refresh_interval_secs: 300,
            level_mode: "threshold".to_owned(),
            legacy_separator: "comma".to_owned(),
            legacy_check_stack_trace: true,
            empty_reload_policy: "retain".to_owned(),
            source_read_timeout_secs: 10,
        }
    }
}

impl FilterSection {
    /// 쉼표로 구분된 소스 목록 문자열을 파싱합니다.
    ///
    /// 빈 항목은 무시합니다. 예: `"a.yml, ,b.txt"` -> `["a.yml", "b.txt"]`
    pub fn parse_source_list(csv: &str) -> Vec<String> {
        csv.split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_owned)
            .collect()
    }

    /// `[filter]` 섹션의 유효성을 검증합니다.
    pub fn validate(&self) -> Result<(), LogsieveError> {
        const MAX_REFRESH_INTERVAL_SECS: u64 = 86_400; // 1 day

        if self.refresh_interval_secs == 0 || self.refresh_interval_secs > MAX_REFRESH_INTERVAL_SECS
        {
            return Err(ConfigError::InvalidValue {
                field: "filter.refresh_interval_secs".to_owned(),
                reason: format!("must be 1-{MAX_REFRESH_INTERVAL_SECS}"),
            }
            .into());
        }

        if !LEVEL_MODES.contains(&self.level_mode.as_str()) {
            return Err(ConfigError::InvalidValue {
                field: "filter.level_mode".to_owned(),
                reason: format!("must be one of: {}", LEVEL_MODES.join(", ")),
            }
            .into());
        }

        if !LEGACY_SEPARATORS.contains(&self.legacy_separator.as_str()) {
            return Err(ConfigError::InvalidValue {
                field: "filter.legacy_separator".to_owned(),
                reason: format!("must be one of: {}", LEGACY_SEPARATORS.join(", ")),
            }
            .into());
        }

        if !EMPTY_RELOAD_POLICIES.contains(&self.empty_reload_policy.as_str()) {
            return Err(ConfigError::InvalidValue {
                field: "filter.empty_reload_policy".to_owned(),
                reason: format!("must be one of: {}", EMPTY_RELOAD_POLICIES.join(", ")),
            }
            .into());
        }

        if self.source_read_timeout_secs == 0 {
            return Err(ConfigError::InvalidValue {
                field: "filter.source_read_timeout_secs".to_owned(),
                reason: "must be greater than 0".to_owned(),
            }
            .into());
        }

        if self.sources.iter().any(|s| s.trim().is_empty()) {
            return Err(ConfigError::InvalidValue {
                field: "filter.sources".to_owned(),
                reason: "source path must not be empty".to_owned(),
            }
            .into());
        }

        Ok(())
    }
}

/// 메트릭 노출 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MetricsConfig {
    /// Prometheus 엔드포인트 활성화 여부
    pub enabled: bool,
    /// 바인드 주소
    pub listen_addr: String,
    /// 포트
    pub port: u16,
    /// 엔드포인트 경로
    pub endpoint: String,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            listen_addr: "127.0.0.1".to_owned(),
            port: 9464,
            endpoint: "/metrics".to_owned(),
        }
    }
}

// --- 환경변수 오버라이드 헬퍼 ---

fn override_string(target: &mut String, env_key: &str) {
    if let Ok(val) = std::env::var(env_key) {
        *target = val;
    }
}

fn override_bool(target: &mut bool, env_key: &str) {
    if let Ok(val) = std::env::var(env_key) {
        match val.parse::<bool>() {
            Ok(parsed) => *target = parsed,
            Err(_) => warn!(
                env_key,
                value = val.as_str(),
                "failed to parse bool from env var, ignoring"
            ),
        }
    }
}

fn override_u16(target: &mut u16, env_key: &str) {
    if let Ok(val) = std::env::var(env_key) {
        match val.parse::<u16>() {
            Ok(parsed) => *target = parsed,
            Err(_) => warn!(
                env_key,
                value = val.as_str(),
                "failed to parse u16 from env var, ignoring"
            ),
        }
    }
}

fn override_u64(target: &mut u64, env_key: &str) {
    if let Ok(val) = std::env::var(env_key) {
        match val.parse::<u64>() {
            Ok(parsed) => *target = parsed,
            Err(_) => warn!(
                env_key,
                value = val.as_str(),
                "failed to parse u64 from env var, ignoring"
            ),
        }
    }
}

fn override_csv(target: &mut Vec<String>, env_key: &str) {
    if let Ok(val) = std::env::var(env_key) {
        *target = FilterSection::parse_source_list(&val);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    #[test]
    fn default_config_has_sane_values() {
        let config = LogsieveConfig::default();
        assert_eq!(config.general.log_level, "info");
        assert_eq!(config.general.log_format, "json");
        assert!(config.filter.sources.is_empty());
        assert_eq!(config.filter.refresh_interval_secs, 300);
        assert_eq!(config.filter.level_mode, "threshold");
        assert!(config.filter.legacy_check_stack_trace);
        assert!(!config.metrics.enabled);
    }

    #[test]
    fn default_config_passes_validation() {
        LogsieveConfig::default().validate().unwrap();
    }

    #[test]
    fn from_str_empty_toml_uses_defaults() {
        let config = LogsieveConfig::parse("").unwrap();
        assert_eq!(config.filter.empty_reload_policy, "retain");
        assert_eq!(config.filter.legacy_separator, "comma");
    }

    #[test]
    fn from_str_partial_toml_merges_with_defaults() {
        let toml = r#"
[filter]
sources = ["/etc/logsieve/filters.yml", "/etc/logsieve/legacy.txt"]
level_mode = "equality"
"#;
        let config = LogsieveConfig::parse(toml).unwrap();
        assert_eq!(config.filter.sources.len(), 2);
        assert_eq!(config.filter.level_mode, "equality");
        // refresh 주기는 기본값 유지
        assert_eq!(config.filter.refresh_interval_secs, 300);
    }

    #[test]
    fn from_str_invalid_toml_returns_error() {
        let err = LogsieveConfig::parse("invalid = [[[toml").unwrap_err();
        assert!(matches!(
            err,
            LogsieveError::Config(ConfigError::ParseFailed { .. })
        ));
    }

    #[test]
    fn validate_rejects_invalid_log_level() {
        let mut config = LogsieveConfig::default();
        config.general.log_level = "verbose".to_owned();
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("log_level"));
    }

    #[test]
    fn validate_rejects_zero_refresh_interval() {
        let mut config = LogsieveConfig::default();
        config.filter.refresh_interval_secs = 0;
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("refresh_interval_secs"));
    }

    #[test]
    fn validate_rejects_unknown_level_mode() {
        let mut config = LogsieveConfig::default();
        config.filter.level_mode = "ceiling".to_owned();
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("level_mode"));
    }

    #[test]
    fn validate_rejects_unknown_separator() {
        let mut config = LogsieveConfig::default();
        config.filter.legacy_separator = "tab".to_owned();
        assert!(config.validate().is_err());
    }

    #[test]
    fn validate_rejects_blank_source() {
        let mut config = LogsieveConfig::default();
        config.filter.sources = vec!["  ".to_owned()];
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("filter.sources"));
    }

    #[test]
    fn validate_rejects_zero_metrics_port_when_enabled() {
        let mut config = LogsieveConfig::default();
        config.metrics.enabled = true;
        config.metrics.port = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn parse_source_list_skips_blank_entries() {
        let sources = FilterSection::parse_source_list("a.yml, ,b.txt,");
        assert_eq!(sources, vec!["a.yml", "b.txt"]);
        assert!(FilterSection::parse_source_list("").is_empty());
    }

    #[test]
    #[serial]
    fn env_override_sources_csv() {
        let mut config = LogsieveConfig::default();
        // SAFETY: serial_test로 환경변수를 건드리는 테스트를 직렬화합니다.
        unsafe { std::env::set_var("LOGSIEVE_FILTER_SOURCES", "x.yml, y.txt") };
        config.apply_env_overrides();
        assert_eq!(config.filter.sources, vec!["x.yml", "y.txt"]);
        unsafe { std::env::remove_var("LOGSIEVE_FILTER_SOURCES") };
    }

    #[test]
    #[serial]
    fn env_override_invalid_u64_keeps_original() {
        let mut val = 300;
        // SAFETY: serial_test로 환경변수를 건드리는 테스트를 직렬화합니다.
        unsafe { std::env::set_var("TEST_LOGSIEVE_U64_BAD", "soon") };
        override_u64(&mut val, "TEST_LOGSIEVE_U64_BAD");
        assert_eq!(val, 300);
        unsafe { std::env::remove_var("TEST_LOGSIEVE_U64_BAD") };
    }

    #[test]
    #[serial]
    fn env_override_bool_valid() {
        let mut val = true;
        // SAFETY: serial_test로 환경변수를 건드리는 테스트를 직렬화합니다.
        unsafe { std::env::set_var("TEST_LOGSIEVE_BOOL", "false") };
        override_bool(&mut val, "TEST_LOGSIEVE_BOOL");
        assert!(!val);
        unsafe { std::env::remove_var("TEST_LOGSIEVE_BOOL") };
    }

    #[test]
    fn config_serialize_roundtrip() {
        let mut config = LogsieveConfig::default();
        config.filter.sources = vec!["/etc/logsieve/filters.yml".to_owned()];
        let toml_str = toml::to_string_pretty(&config).unwrap();
        let parsed = LogsieveConfig::parse(&toml_str).unwrap();
        assert_eq!(parsed.filter.sources, config.filter.sources);
        assert_eq!(parsed.metrics.port, config.metrics.port);
    }

    #[tokio::test]
    async fn from_file_not_found() {
        let err = LogsieveConfig::from_file("/nonexistent/path/logsieve.toml")
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            LogsieveError::Config(ConfigError::FileNotFound { .. })
        ));
    }
}
