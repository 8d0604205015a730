//! 레벨별 억제 카운터
//!
//! 억제된 이벤트 수를 이벤트 레벨별로 누적합니다. 슬롯은 레벨마다 하나씩
//! 고정 배열로 존재하며, 0인 레벨은 스냅샷에 나타나지 않습니다.
//! 카운터는 단조 증가하며 규칙 리로드와 무관하게 유지됩니다.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};

use metrics::counter;

use logsieve_core::metrics as m;
use logsieve_core::types::Level;

/// 레벨별 억제 카운터
///
/// 여러 스레드에서 동시에 증가시켜도 카운트가 유실되지 않습니다.
#[derive(Debug, Default)]
pub struct DenialCounters {
    slots: [AtomicU64; Level::COUNT],
}

impl DenialCounters {
    /// 새 카운터를 생성합니다.
    pub fn new() -> Self {
        Self::default()
    }

    /// 레벨의 카운트를 1 증가시킵니다.
    pub fn increment(&self, level: Level) {
        self.slots[level.index()].fetch_add(1, Ordering::Relaxed);
        counter!(m::FILTER_DENIED_TOTAL, m::LABEL_LEVEL => level.as_str()).increment(1);
    }

    /// 레벨의 현재 카운트
    pub fn get(&self, level: Level) -> u64 {
        self.slots[level.index()].load(Ordering::Relaxed)
    }

    /// 전체 억제 수
    pub fn total(&self) -> u64 {
        self.slots.iter().map(|slot| slot.load(Ordering::Relaxed)).sum()
    }

    /// 0이 아닌 레벨의 카운트 스냅샷
    pub fn snapshot(&self) -> BTreeMap<Level, u64> {
        Level::ALL
            .iter()
            .filter_map(|&level| {
                let count = self.get(level);
                (count > 0).then_some((level, count))
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn new_counters_snapshot_is_empty() {
        let counters = DenialCounters::new();
        assert!(counters.snapshot().is_empty());
        assert_eq!(counters.total(), 0);
    }

    #[test]
    fn increment_creates_entry_for_level() {
        let counters = DenialCounters::new();
        counters.increment(Level::Warn);
        counters.increment(Level::Warn);
        counters.increment(Level::Debug);

        let snapshot = counters.snapshot();
        assert_eq!(snapshot.len(), 2);
        assert_eq!(snapshot[&Level::Warn], 2);
        assert_eq!(snapshot[&Level::Debug], 1);
        assert!(!snapshot.contains_key(&Level::Info));
        assert_eq!(counters.total(), 3);
    }

    #[test]
    fn concurrent_increments_are_not_lost() {
        let counters = Arc::new(DenialCounters::new());
        let threads: Vec<_> = (0..8)
            .map(|_| {
                let counters = Arc::clone(&counters);
                std::thread::spawn(move || {
                    for _ in 0..10_000 {
                        counters.increment(Level::Info);
                    }
                })
            })
            .collect();
        for t in threads {
            t.join().unwrap();
        }
        assert_eq!(counters.get(Level::Info), 80_000);
    }
}
