//! 필터 trait -- 호스트 로깅 프레임워크와의 확장 포인트 정의

use crate::types::{Decision, LogEvent};

/// 이벤트 필터 trait
///
/// 호스트 로깅 프레임워크는 이벤트마다 `decide`를 호출하고,
/// `Accept`인 이벤트만 전달/포맷/전송합니다.
///
/// 구현체는 다음을 보장해야 합니다:
/// - 여러 스레드에서 동시에 호출 가능 (`Send + Sync`)
/// - 블로킹, I/O, 패닉 없이 항상 판정을 반환 (전역 함수)
pub trait EventFilter: Send + Sync {
    /// 필터 이름
    fn name(&self) -> &str;

    /// 이벤트의 통과/억제를 판정
    fn decide(&self, event: &LogEvent) -> Decision;
}

impl<F: EventFilter + ?Sized> EventFilter for std::sync::Arc<F> {
    fn name(&self) -> &str {
        (**self).name()
    }

    fn decide(&self, event: &LogEvent) -> Decision {
        (**self).decide(event)
    }
}
