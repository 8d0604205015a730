//! 필터 엔진 에러 타입
//!
//! [`FilterError`]는 규칙 로딩, 파싱, 설정 검증 중 발생하는 에러를 표현합니다.
//! 이 에러들은 `decide` 호출자에게 전파되지 않고 경고 로그와 메트릭으로만 보고됩니다.
//! `From<FilterError> for LogsieveError` 변환이 구현되어 있어
//! 설정 검증 등 상위 레이어에서는 `?` 연산자로 전파할 수 있습니다.

use logsieve_core::error::LogsieveError;

/// 필터 엔진 도메인 에러
#[derive(Debug, thiserror::Error)]
pub enum FilterError {
    /// 규칙 소스 전체를 읽거나 해석할 수 없음 (해당 소스만 건너뜀)
    #[error("source load error: {path}: {reason}")]
    SourceLoad {
        /// 소스 경로
        path: String,
        /// 실패 사유
        reason: String,
    },

    /// 규칙 레코드 하나가 잘못됨 (해당 레코드만 건너뜀)
    #[error("rule parse error: {origin}: {reason}")]
    RuleParse {
        /// 레코드 위치 (`path#3`, `path:12` 등)
        origin: String,
        /// 실패 사유
        reason: String,
    },

    /// 설정 에러
    #[error("config error: {field}: {reason}")]
    Config {
        /// 설정 필드명
        field: String,
        /// 에러 사유
        reason: String,
    },

    /// 정규식 컴파일 에러
    #[error("regex error: {0}")]
    Regex(#[from] regex::Error),
}

impl From<FilterError> for LogsieveError {
    fn from(err: FilterError) -> Self {
        LogsieveError::Filter(err.to_string())
    }
}
