//! 提醒升级调度器
//!
//! Fixed-interval scan over all stamped ready orders. The source system
//! re-checked its elapsed-time condition only when the document happened
//! to be rewritten; here the check runs on its own clock so a reminder
//! never depends on an unrelated write arriving at the right moment.
//!
//! 注册为 `TaskKind::Periodic`，在 `Server::run()` 中启动。

use std::time::Duration;

use tokio_util::sync::CancellationToken;

use super::LifecycleEngine;

/// Escalation scheduler
///
/// One tick = one [`LifecycleEngine::run_escalations`] pass. The tick
/// interval only bounds notification latency; the due-time math itself
/// lives in the engine and is anchored on `notification_sent_at`.
pub struct EscalationScheduler {
    engine: LifecycleEngine,
    tick: Duration,
    shutdown: CancellationToken,
}

impl EscalationScheduler {
    pub fn new(engine: LifecycleEngine, tick: Duration, shutdown: CancellationToken) -> Self {
        Self {
            engine,
            tick,
            shutdown,
        }
    }

    /// 主循环：周期触发直到 shutdown
    pub async fn run(self) {
        tracing::info!(tick_ms = self.tick.as_millis() as u64, "Escalation scheduler started");

        loop {
            tokio::select! {
                _ = tokio::time::sleep(self.tick) => {}
                _ = self.shutdown.cancelled() => {
                    tracing::info!("Escalation scheduler received shutdown signal");
                    break;
                }
            }

            let fired = self
                .engine
                .run_escalations(shared::util::now_millis())
                .await;
            if fired > 0 {
                tracing::debug!(fired, "Escalation tick applied notifications");
            }
        }

        tracing::info!("Escalation scheduler stopped");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::test_support::test_pool;
    use crate::message::MessageBus;
    use crate::push::MockPushSender;
    use std::sync::Arc;

    #[tokio::test]
    async fn shutdown_stops_the_loop() {
        let pool = test_pool().await;
        let engine = LifecycleEngine::new(
            pool,
            Arc::new(MockPushSender::new()),
            MessageBus::new(8),
        );

        let shutdown = CancellationToken::new();
        let scheduler =
            EscalationScheduler::new(engine, Duration::from_millis(10), shutdown.clone());

        let handle = tokio::spawn(scheduler.run());
        tokio::time::sleep(Duration::from_millis(30)).await;
        shutdown.cancel();

        tokio::time::timeout(Duration::from_secs(1), handle)
            .await
            .expect("scheduler did not stop after shutdown")
            .unwrap();
    }
}
