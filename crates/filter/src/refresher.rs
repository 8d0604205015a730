//! 주기적 규칙 리로드
//!
//! [`ConfigRefresher`]는 고정 주기마다 모든 소스를 다시 로드하고 결과 규칙 세트를
//! [`FilterEngine`]에 게시합니다. 첫 리로드는 시작 후 한 주기가 지난 시점에 실행되며,
//! 리로드가 주기보다 오래 걸려 놓친 틱은 건너뜁니다.
//!
//! 리로드 실패는 판정을 막지 않습니다. 게시 전까지는 이전 세트가 계속 사용됩니다.

use std::sync::Arc;
use std::time::Duration;

use metrics::counter;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

use logsieve_core::metrics as m;

use crate::config::EmptyReloadPolicy;
use crate::engine::FilterEngine;
use crate::rule::RuleLoader;

/// 리로드 1회의 결과
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshOutcome {
    /// 새 규칙 세트를 게시함
    Published {
        /// 게시된 규칙 수
        rules: usize,
    },
    /// 소스 실패로 빈 세트가 만들어져 이전 세트를 유지함
    Retained {
        /// 유지된 규칙 수
        previous_rules: usize,
    },
}

/// 주기적 규칙 리로더
pub struct ConfigRefresher {
    engine: Arc<FilterEngine>,
    loader: RuleLoader,
    interval: Duration,
    policy: EmptyReloadPolicy,
}

impl ConfigRefresher {
    /// 새 리로더를 생성합니다.
    pub fn new(
        engine: Arc<FilterEngine>,
        loader: RuleLoader,
        interval: Duration,
        policy: EmptyReloadPolicy,
    ) -> Self {
        Self {
            engine,
            loader,
            interval,
            policy,
        }
    }

    /// 리로드 주기
    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// 소스를 한 번 다시 로드하고 정책에 따라 게시합니다.
    ///
    /// `RetainPrevious` 정책에서는 새 세트가 비어 있고, 실패한 소스가 있고,
    /// 이전 세트가 비어 있지 않을 때만 이전 세트를 유지합니다.
    pub async fn refresh_once(&self) -> RefreshOutcome {
        let report = self.loader.load_with_report().await;
        let failed_sources = report.failed_sources();
        let previous_rules = self.engine.rule_count();

        if self.policy == EmptyReloadPolicy::RetainPrevious
            && report.rule_set.is_empty()
            && failed_sources > 0
            && previous_rules > 0
        {
            tracing::warn!(
                failed_sources,
                previous_rules,
                "reload produced no rules because sources failed, keeping previous rule set"
            );
            counter!(m::FILTER_RELOADS_TOTAL, m::LABEL_RESULT => "retained").increment(1);
            return RefreshOutcome::Retained { previous_rules };
        }

        let rules = report.rule_set.len();
        self.engine.publish(report.rule_set);
        counter!(m::FILTER_RELOADS_TOTAL, m::LABEL_RESULT => "published").increment(1);
        tracing::info!(
            rules,
            previous_rules,
            failed_sources,
            "refreshed filter rules"
        );

        RefreshOutcome::Published { rules }
    }

    /// 백그라운드 리로드 태스크를 시작합니다. tokio 런타임 안에서 호출해야 합니다.
    pub fn start(self) -> RefresherHandle {
        let token = CancellationToken::new();
        let task_token = token.clone();
        let period = self.interval;

        tracing::info!(
            interval_secs = period.as_secs(),
            sources = self.loader.sources().len(),
            "starting rule refresher"
        );

        let task = tokio::spawn(async move {
            let mut ticker = tokio::time::interval_at(Instant::now() + period, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

            loop {
                tokio::select! {
                    _ = task_token.cancelled() => break,
                    _ = ticker.tick() => {
                        tokio::select! {
                            _ = task_token.cancelled() => break,
                            _ = self.refresh_once() => {}
                        }
                    }
                }
            }

            tracing::info!("rule refresher stopped");
        });

        RefresherHandle {
            token,
            task: Some(task),
        }
    }
}

/// 실행 중인 리로드 태스크 핸들
///
/// 핸들이 드롭되면 태스크에 중지 신호를 보냅니다.
pub struct RefresherHandle {
    token: CancellationToken,
    task: Option<JoinHandle<()>>,
}

impl RefresherHandle {
    /// 태스크를 중지하고 종료를 기다립니다.
    ///
    /// 진행 중인 리로드는 게시 없이 중단됩니다.
    pub async fn stop(mut self) {
        self.token.cancel();
        if let Some(task) = self.task.take() {
            if let Err(e) = task.await {
                tracing::warn!(error = %e, "rule refresher task ended abnormally");
            }
        }
    }

    /// 태스크 실행 여부
    pub fn is_running(&self) -> bool {
        self.task.as_ref().is_some_and(|task| !task.is_finished())
    }
}

impl Drop for RefresherHandle {
    fn drop(&mut self) {
        self.token.cancel();
    }
}
