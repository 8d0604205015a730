#![doc = include_str!("../README.md")]
//!
//! # 모듈 구성
//!
//! - [`rule`]: 규칙 정의, 불변 규칙 세트, 소스 로더, 매처
//! - [`engine`]: 이벤트 판정 및 규칙 세트 게시 (EventFilter trait 구현)
//! - [`counters`]: 레벨별 억제 카운터
//! - [`refresher`]: 주기적 규칙 리로드 태스크
//! - [`config`]: 필터 설정 (core 설정 확장)
//! - [`error`]: 도메인 에러 타입

pub mod config;
pub mod counters;
pub mod engine;
pub mod error;
pub mod refresher;
pub mod rule;

// --- 주요 타입 re-export ---

// 엔진
pub use engine::FilterEngine;

// 카운터
pub use counters::DenialCounters;

// 리로드
pub use refresher::{ConfigRefresher, RefreshOutcome, RefresherHandle};

// 설정
pub use config::{EmptyReloadPolicy, FilterConfig, FilterConfigBuilder};

// 에러
pub use error::FilterError;

// 규칙
pub use rule::{
    LegacySeparator, LevelMode, LoadReport, Matcher, ParseOptions, Rule, RuleLoader, RuleSet,
    SourceFormat,
};
