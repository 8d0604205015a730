//! 규칙 소스 로더 -- 설정된 소스 목록에서 규칙 세트를 구성합니다.
//!
//! 소스는 설정된 순서대로 처리되며, 각 소스의 규칙이 그 순서 그대로 이어 붙여집니다.
//! 존재하지 않는 소스는 규칙을 기여하지 않습니다. 읽거나 해석할 수 없는 소스와
//! 잘못된 레코드는 경고 로그를 남기고 건너뜁니다. 로딩 자체는 실패하지 않습니다.

use std::path::{Path, PathBuf};
use std::time::Duration;

use metrics::counter;
use serde_yaml::Value;

use logsieve_core::metrics as m;
use logsieve_core::types::Level;

use crate::error::FilterError;

use super::matcher::Matcher;
use super::types::{ParseOptions, RawRuleRecord, SourceFormat};
use super::{Rule, RuleSet};

/// 소스 하나의 최대 크기
pub const MAX_SOURCE_BYTES: u64 = 10 * 1024 * 1024; // 10MB
/// 규칙 세트 최대 규칙 수
pub const MAX_RULES_COUNT: usize = 10_000;
/// 기본 소스 읽기 타임아웃
pub const DEFAULT_READ_TIMEOUT: Duration = Duration::from_secs(10);

/// 소스 하나를 파싱한 결과
#[derive(Debug, Default)]
pub struct ParsedSource {
    /// 유효한 규칙 (소스 내 순서 유지)
    pub rules: Vec<Rule>,
    /// 거부된 레코드의 에러
    pub rejected: Vec<FilterError>,
}

/// 소스 하나의 로딩 결과
#[derive(Debug)]
pub enum SourceOutcome {
    /// 파일이 존재하지 않음 (규칙 없음, 에러 아님)
    Missing,
    /// 로딩 성공
    Loaded {
        /// 기여한 규칙 수
        rules: usize,
        /// 거부된 레코드 사유
        rejected: Vec<String>,
    },
    /// 소스 전체 로딩 실패
    Failed {
        /// 실패 사유
        reason: String,
    },
}

/// 소스별 로딩 보고
#[derive(Debug)]
pub struct SourceReport {
    /// 소스 경로
    pub path: PathBuf,
    /// 결과
    pub outcome: SourceOutcome,
}

/// 전체 로딩 보고
#[derive(Debug)]
pub struct LoadReport {
    /// 구성된 규칙 세트
    pub rule_set: RuleSet,
    /// 소스별 결과 (설정 순서)
    pub sources: Vec<SourceReport>,
}

impl LoadReport {
    /// 로딩에 실패한 소스 수
    pub fn failed_sources(&self) -> usize {
        self.sources
            .iter()
            .filter(|s| matches!(s.outcome, SourceOutcome::Failed { .. }))
            .count()
    }

    /// 거부된 레코드 수
    pub fn rejected_records(&self) -> usize {
        self.sources
            .iter()
            .map(|s| match &s.outcome {
                SourceOutcome::Loaded { rejected, .. } => rejected.len(),
                _ => 0,
            })
            .sum()
    }

    /// 소스 실패 또는 레코드 거부가 있었는지 여부
    pub fn has_errors(&self) -> bool {
        self.failed_sources() > 0 || self.rejected_records() > 0
    }
}

/// 규칙 소스 로더
///
/// # 사용 예시
/// ```ignore
/// let loader = RuleLoader::new(vec!["/etc/logsieve/filters.yml".into()], ParseOptions::default());
/// let rule_set = loader.load().await;
/// ```
#[derive(Debug, Clone)]
pub struct RuleLoader {
    sources: Vec<PathBuf>,
    options: ParseOptions,
    read_timeout: Duration,
    max_source_bytes: u64,
}

impl RuleLoader {
    /// 새 로더를 생성합니다.
    pub fn new(sources: Vec<PathBuf>, options: ParseOptions) -> Self {
        Self {
            sources,
            options,
            read_timeout: DEFAULT_READ_TIMEOUT,
            max_source_bytes: MAX_SOURCE_BYTES,
        }
    }

    /// 소스별 읽기 타임아웃을 설정합니다.
    pub fn with_read_timeout(mut self, timeout: Duration) -> Self {
        self.read_timeout = timeout;
        self
    }

    /// 소스 최대 크기를 설정합니다.
    pub fn with_max_source_bytes(mut self, max: u64) -> Self {
        self.max_source_bytes = max;
        self
    }

    /// 설정된 소스 목록
    pub fn sources(&self) -> &[PathBuf] {
        &self.sources
    }

    /// 파싱 옵션
    pub fn options(&self) -> &ParseOptions {
        &self.options
    }

    /// 모든 소스에서 규칙 세트를 구성합니다. 실패하지 않습니다.
    pub async fn load(&self) -> RuleSet {
        self.load_with_report().await.rule_set
    }

    /// 규칙 세트와 소스별 결과를 함께 반환합니다.
    pub async fn load_with_report(&self) -> LoadReport {
        let mut rules = Vec::new();
        let mut sources = Vec::with_capacity(self.sources.len());

        for path in &self.sources {
            let outcome = match self.load_source(path).await {
                Ok(None) => {
                    tracing::debug!(
                        path = %path.display(),
                        "rule source does not exist, contributing no rules"
                    );
                    SourceOutcome::Missing
                }
                Ok(Some(parsed)) => {
                    let mut rejected = Vec::with_capacity(parsed.rejected.len());
                    for err in parsed.rejected {
                        tracing::warn!(
                            path = %path.display(),
                            error = %err,
                            "skipping malformed rule record"
                        );
                        counter!(m::FILTER_RULE_ERRORS_TOTAL).increment(1);
                        rejected.push(err.to_string());
                    }
                    let count = parsed.rules.len();
                    rules.extend(parsed.rules);
                    SourceOutcome::Loaded {
                        rules: count,
                        rejected,
                    }
                }
                Err(err) => {
                    tracing::warn!(
                        path = %path.display(),
                        error = %err,
                        "failed to load rule source, skipping"
                    );
                    counter!(m::FILTER_SOURCE_ERRORS_TOTAL).increment(1);
                    SourceOutcome::Failed {
                        reason: err.to_string(),
                    }
                }
            };
            sources.push(SourceReport {
                path: path.clone(),
                outcome,
            });
        }

        if rules.len() > MAX_RULES_COUNT {
            tracing::warn!(
                count = rules.len(),
                max = MAX_RULES_COUNT,
                "too many rules, truncating rule set"
            );
            rules.truncate(MAX_RULES_COUNT);
        }

        tracing::info!(
            sources = self.sources.len(),
            count = rules.len(),
            "loaded filter rules"
        );

        LoadReport {
            rule_set: RuleSet::new(rules),
            sources,
        }
    }

    /// 소스 하나를 읽고 파싱합니다. 파일이 없으면 `None`을 반환합니다.
    async fn load_source(&self, path: &Path) -> Result<Option<ParsedSource>, FilterError> {
        let origin = path.display().to_string();
        let source_error = |reason: String| FilterError::SourceLoad {
            path: origin.clone(),
            reason,
        };

        let read = async {
            let metadata = match tokio::fs::metadata(path).await {
                Ok(metadata) => metadata,
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
                Err(e) => return Err(source_error(format!("failed to read metadata: {e}"))),
            };

            if !metadata.is_file() {
                return Err(source_error("not a regular file".to_owned()));
            }

            if metadata.len() > self.max_source_bytes {
                return Err(source_error(format!(
                    "file too large: {} bytes (max: {})",
                    metadata.len(),
                    self.max_source_bytes
                )));
            }

            let content = tokio::fs::read_to_string(path)
                .await
                .map_err(|e| source_error(format!("failed to read file: {e}")))?;

            Ok::<Option<String>, FilterError>(Some(content))
        };

        let content = match tokio::time::timeout(self.read_timeout, read).await {
            Ok(result) => result?,
            Err(_) => {
                return Err(source_error(format!(
                    "read timed out after {}ms",
                    self.read_timeout.as_millis()
                )));
            }
        };

        let Some(content) = content else {
            return Ok(None);
        };

        let parsed = match SourceFormat::from_path(path) {
            SourceFormat::Structured => parse_structured(&content, &origin, &self.options)?,
            SourceFormat::Lines => parse_lines(&content, &origin, &self.options),
        };

        Ok(Some(parsed))
    }
}

/// 구조화 소스를 파싱합니다.
///
/// 최상위가 레코드 목록이거나 `filters` 키 아래 레코드 목록인 매핑이어야 합니다.
/// 레코드는 개별적으로 검증되며 잘못된 레코드는 `rejected`에 모입니다.
///
/// # Errors
/// 문서 자체를 해석할 수 없거나 최상위 구조가 맞지 않으면 에러를 반환합니다.
pub fn parse_structured(
    content: &str,
    origin: &str,
    options: &ParseOptions,
) -> Result<ParsedSource, FilterError> {
    if content.trim().is_empty() {
        return Ok(ParsedSource::default());
    }

    let document: Value = serde_yaml::from_str(content).map_err(|e| FilterError::SourceLoad {
        path: origin.to_owned(),
        reason: format!("YAML parse error: {e}"),
    })?;

    let records = match document {
        Value::Null => return Ok(ParsedSource::default()),
        Value::Sequence(records) => records,
        Value::Mapping(mapping) => match mapping.get("filters") {
            Some(Value::Sequence(records)) => records.clone(),
            Some(Value::Null) => return Ok(ParsedSource::default()),
            Some(_) => {
                return Err(FilterError::SourceLoad {
                    path: origin.to_owned(),
                    reason: "`filters` must be a list of rule records".to_owned(),
                });
            }
            None => {
                return Err(FilterError::SourceLoad {
                    path: origin.to_owned(),
                    reason: "expected a list of rule records or a `filters` key".to_owned(),
                });
            }
        },
        _ => {
            return Err(FilterError::SourceLoad {
                path: origin.to_owned(),
                reason: "expected a list of rule records or a `filters` key".to_owned(),
            });
        }
    };

    let mut parsed = ParsedSource::default();
    for (idx, value) in records.into_iter().enumerate() {
        let record_origin = format!("{origin}#{}", idx + 1);
        let result = serde_yaml::from_value::<RawRuleRecord>(value)
            .map_err(|e| FilterError::RuleParse {
                origin: record_origin.clone(),
                reason: e.to_string(),
            })
            .and_then(|record| record.into_rule(&record_origin, options));

        match result {
            Ok(rule) => parsed.rules.push(rule),
            Err(err) => parsed.rejected.push(err),
        }
    }

    Ok(parsed)
}

/// legacy 라인 소스를 파싱합니다.
///
/// 각 라인은 `level<sep>pattern` 형식이며 패턴은 항상 전체 일치 정규식입니다.
/// 첫 번째 구분자에서만 분리하므로 패턴에 구분자가 포함되어도 됩니다.
/// 빈 라인과 `#`으로 시작하는 라인은 무시합니다.
pub fn parse_lines(content: &str, origin: &str, options: &ParseOptions) -> ParsedSource {
    let mut parsed = ParsedSource::default();

    for (idx, line) in content.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        let line_origin = format!("{origin}:{}", idx + 1);
        match parse_line(line, &line_origin, options) {
            Ok(rule) => parsed.rules.push(rule),
            Err(err) => parsed.rejected.push(err),
        }
    }

    parsed
}

fn parse_line(line: &str, origin: &str, options: &ParseOptions) -> Result<Rule, FilterError> {
    let parse_error = |reason: String| FilterError::RuleParse {
        origin: origin.to_owned(),
        reason,
    };

    let separator = options.legacy_separator.as_char();
    let (level, pattern) = line
        .split_once(separator)
        .ok_or_else(|| parse_error(format!("expected `level{separator}pattern`")))?;

    let level: Level = level
        .trim()
        .parse()
        .map_err(|e: logsieve_core::types::UnknownLevel| parse_error(e.to_string()))?;

    let pattern = pattern.trim();
    if pattern.is_empty() {
        return Err(parse_error("pattern must not be empty".to_owned()));
    }

    let matcher =
        Matcher::regex(pattern).map_err(|e| parse_error(format!("invalid regex: {e}")))?;

    Ok(Rule::new(level, matcher)
        .with_level_mode(options.default_level_mode)
        .with_stack_trace(options.legacy_check_stack_trace))
}
