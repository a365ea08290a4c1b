//! 在线状态清理任务
//!
//! 每 15 秒扫描一次参与者，最近一次心跳超过 10 秒的参与者会被移出房间，
//! 同时写入一条离开通知。每个参与者的清理是独立事务，彼此并发执行；
//! 某个参与者清理失败只会记录日志，下一轮重新扫描时自然重试。

use std::sync::Arc;
use std::time::Duration;

use domain::{staleness_cutoff, Message, MessageId, ParticipantName};
use futures::future::join_all;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

use crate::{
    clock::Clock,
    error::ApplicationError,
    repository::{ParticipantRepository, TransactionManager},
};

/// 扫描周期，固定值
pub const SWEEP_INTERVAL: Duration = Duration::from_secs(15);

/// 心跳过期阈值，固定值
pub const STALENESS_THRESHOLD: time::Duration = time::Duration::seconds(10);

/// 一轮扫描的结果
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SweepReport {
    pub evicted: Vec<ParticipantName>,
    pub failed: usize,
}

impl SweepReport {
    pub fn is_empty(&self) -> bool {
        self.evicted.is_empty() && self.failed == 0
    }
}

pub struct PresenceSweeperDependencies {
    pub participant_repository: Arc<dyn ParticipantRepository>,
    pub transaction_manager: Arc<dyn TransactionManager>,
    pub clock: Arc<dyn Clock>,
}

pub struct PresenceSweeper {
    deps: PresenceSweeperDependencies,
}

impl PresenceSweeper {
    pub fn new(deps: PresenceSweeperDependencies) -> Self {
        Self { deps }
    }

    /// 执行一轮扫描。
    ///
    /// 查询过期参与者失败时整轮放弃并返回错误；单个参与者的清理失败计入 `failed`。
    pub async fn sweep_once(&self) -> Result<SweepReport, ApplicationError> {
        let now = self.deps.clock.now();
        let cutoff = staleness_cutoff(now, STALENESS_THRESHOLD);

        let stale = self.deps.participant_repository.list_stale(cutoff).await?;
        if stale.is_empty() {
            return Ok(SweepReport::default());
        }

        let transactions = &self.deps.transaction_manager;
        let attempts = stale.into_iter().map(|participant| async move {
            let notice = Message::left(MessageId::generate(), &participant.name, now);
            let result = transactions
                .evict_with_notice(&participant.name, cutoff, notice)
                .await;
            (participant.name, result)
        });

        let mut report = SweepReport::default();
        for (name, result) in join_all(attempts).await {
            match result {
                Ok(true) => {
                    tracing::info!(participant = %name, "participant evicted after missing heartbeats");
                    report.evicted.push(name);
                }
                Ok(false) => {
                    tracing::debug!(participant = %name, "participant refreshed before eviction");
                }
                Err(err) => {
                    tracing::warn!(participant = %name, error = %err, "eviction abandoned, will retry next sweep");
                    report.failed += 1;
                }
            }
        }

        Ok(report)
    }

    /// 周期执行扫描直到 `shutdown` 被取消。第一轮在启动一个周期之后执行。
    pub async fn run(&self, shutdown: CancellationToken) {
        let mut ticker = interval_at(Instant::now() + SWEEP_INTERVAL, SWEEP_INTERVAL);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        tracing::info!(
            interval_secs = SWEEP_INTERVAL.as_secs(),
            threshold_secs = STALENESS_THRESHOLD.whole_seconds(),
            "presence sweeper started"
        );

        loop {
            tokio::select! {
                _ = shutdown.cancelled() => break,
                _ = ticker.tick() => {
                    match self.sweep_once().await {
                        Ok(report) if !report.is_empty() => {
                            tracing::info!(
                                evicted = report.evicted.len(),
                                failed = report.failed,
                                "presence sweep finished"
                            );
                        }
                        Ok(_) => {}
                        Err(err) => {
                            tracing::warn!(error = %err, "presence sweep aborted");
                        }
                    }
                }
            }
        }

        tracing::info!("presence sweeper stopped");
    }

    pub fn spawn(self: Arc<Self>, shutdown: CancellationToken) -> JoinHandle<()> {
        tokio::spawn(async move { self.run(shutdown).await })
    }
}
