use std::sync::Arc;

use sqlx::SqlitePool;

use crate::core::Config;
use crate::db::DbService;
use crate::lifecycle::LifecycleEngine;
use crate::message::MessageBus;
use crate::push::{FcmSender, PushSender};

/// 服务器状态 - 持有所有服务的共享引用
///
/// 使用 Arc/池句柄实现浅拷贝，所有权成本极低。
///
/// | 字段 | 类型 | 说明 |
/// |------|------|------|
/// | config | Config | 配置项 (不可变) |
/// | pool | SqlitePool | SQLite 连接池 |
/// | bus | MessageBus | 同步总线 |
/// | engine | LifecycleEngine | 订单生命周期引擎 |
#[derive(Clone)]
pub struct ServerState {
    /// 服务器配置
    pub config: Config,
    /// SQLite 连接池
    pub pool: SqlitePool,
    /// 同步总线 (live-query 替代)
    pub bus: MessageBus,
    /// 订单生命周期引擎
    pub engine: LifecycleEngine,
}

impl ServerState {
    /// 创建服务器状态 (手动构造)
    ///
    /// 测试场景用它注入 mock 推送发送器；生产路径使用 [`Self::initialize`]。
    pub fn new(config: Config, pool: SqlitePool, notifier: Arc<dyn PushSender>) -> Self {
        let bus = MessageBus::new(config.bus_capacity);
        let engine = LifecycleEngine::new(pool.clone(), notifier, bus.clone());
        Self {
            config,
            pool,
            bus,
            engine,
        }
    }

    /// 初始化服务器状态
    ///
    /// 按顺序初始化：
    /// 1. 工作目录
    /// 2. 数据库 (work_dir/pager.db, 含迁移)
    /// 3. 同步总线 + FCM 推送 + 生命周期引擎
    ///
    /// # Panics
    ///
    /// 工作目录或数据库初始化失败时 panic
    pub async fn initialize(config: &Config) -> Self {
        config
            .ensure_work_dir()
            .expect("Failed to create work directory");

        let db_path = config.database_path();
        let db_service = DbService::new(&db_path.to_string_lossy())
            .await
            .expect("Failed to initialize database");

        if config.fcm_server_key.is_empty() {
            tracing::warn!(
                "FCM_SERVER_KEY is empty; every push send will be rejected and handled as a send failure"
            );
        }
        let notifier: Arc<dyn PushSender> = Arc::new(FcmSender::new(
            &config.fcm_endpoint,
            &config.fcm_server_key,
        ));

        Self::new(config.clone(), db_service.pool, notifier)
    }

    /// 广播资源变更通知 (版本号自动递增)
    pub fn broadcast_sync<T: serde::Serialize>(
        &self,
        resource: &str,
        action: &str,
        id: &str,
        data: Option<&T>,
    ) {
        self.bus.publish_sync(resource, action, id, data);
    }
}
