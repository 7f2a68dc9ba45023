//! 同步总线 - live-query 替代
//!
//! In-process broadcast channel carrying one [`BusMessage`] per resource
//! change. Connected clients receive the stream over the SSE endpoint and
//! re-render from the payloads, replacing the document store's live-query
//! subscriptions of the source system.

use dashmap::DashMap;
use shared::message::{BusMessage, SyncPayload};
use std::sync::Arc;
use tokio::sync::broadcast;

/// 资源版本管理器
///
/// 使用 DashMap 实现无锁并发的版本号管理。
/// 每种资源类型维护独立的版本号，支持原子递增。
#[derive(Debug, Default)]
pub struct ResourceVersions {
    versions: DashMap<String, u64>,
}

impl ResourceVersions {
    pub fn new() -> Self {
        Self {
            versions: DashMap::new(),
        }
    }

    /// 递增指定资源的版本号并返回新值
    pub fn increment(&self, resource: &str) -> u64 {
        let mut entry = self.versions.entry(resource.to_string()).or_insert(0);
        *entry += 1;
        *entry
    }

    /// 获取指定资源的当前版本号
    pub fn get(&self, resource: &str) -> u64 {
        self.versions.get(resource).map(|v| *v).unwrap_or(0)
    }
}

/// Sync bus handle. Cheap to clone; all clones share one channel and one
/// version counter set.
#[derive(Clone, Debug)]
pub struct MessageBus {
    tx: broadcast::Sender<BusMessage>,
    versions: Arc<ResourceVersions>,
}

impl MessageBus {
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self {
            tx,
            versions: Arc::new(ResourceVersions::new()),
        }
    }

    /// Subscribe to all bus messages from this point on.
    pub fn subscribe(&self) -> broadcast::Receiver<BusMessage> {
        self.tx.subscribe()
    }

    /// Publish a raw bus message. Lagging or absent receivers are the
    /// receivers' problem; publishing never blocks.
    pub fn publish(&self, message: BusMessage) {
        let _ = self.tx.send(message);
    }

    /// 广播资源变更通知
    ///
    /// 版本号由 ResourceVersions 自动递增管理。
    ///
    /// # 参数
    /// - `resource`: 资源类型 (如 "orders", "manager_pin")
    /// - `action`: 变更类型 ("created", "updated", "deleted")
    /// - `id`: 资源 ID
    /// - `data`: 资源数据 (deleted 时为 None)
    pub fn publish_sync<T: serde::Serialize>(
        &self,
        resource: &str,
        action: &str,
        id: &str,
        data: Option<&T>,
    ) {
        let version = self.versions.increment(resource);
        let payload = SyncPayload {
            resource: resource.to_string(),
            version,
            action: action.to_string(),
            id: id.to_string(),
            data: data.and_then(|d| serde_json::to_value(d).ok()),
        };
        self.publish(BusMessage::sync(&payload));
    }
}
