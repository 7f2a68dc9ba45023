/// 服务器配置 - 呼叫器后端的所有配置项
///
/// # 环境变量
///
/// 所有配置项都可以通过环境变量覆盖：
///
/// | 环境变量 | 默认值 | 说明 |
/// |----------|--------|------|
/// | WORK_DIR | /var/lib/buvette/pager | 工作目录 |
/// | HTTP_PORT | 3000 | HTTP 服务端口 |
/// | ENVIRONMENT | development | 运行环境 |
/// | FCM_ENDPOINT | https://fcm.googleapis.com/fcm/send | FCM 发送地址 |
/// | FCM_SERVER_KEY | (empty) | FCM 服务器密钥 |
/// | ESCALATION_TICK_MS | 5000 | 提醒调度器扫描间隔(毫秒) |
/// | BUS_CAPACITY | 1024 | 同步总线通道容量 |
/// | LOG_DIR | (none) | 日志文件目录(为空则仅输出到终端) |
///
/// # 示例
///
/// ```ignore
/// WORK_DIR=/data/pager HTTP_PORT=8080 cargo run
/// ```
#[derive(Debug, Clone)]
pub struct Config {
    /// 工作目录，存储数据库、日志等文件
    pub work_dir: String,
    /// HTTP API 服务端口
    pub http_port: u16,
    /// 运行环境: development | staging | production
    pub environment: String,
    /// FCM HTTP 发送端点
    pub fcm_endpoint: String,
    /// FCM 服务器密钥 (为空时所有推送将被 FCM 拒绝并按发送失败处理)
    pub fcm_server_key: String,
    /// 提醒调度器扫描间隔 (毫秒)
    pub escalation_tick_ms: u64,
    /// 同步总线通道容量
    pub bus_capacity: usize,
    /// 日志文件目录
    pub log_dir: Option<String>,
}

impl Config {
    /// 从环境变量加载配置
    ///
    /// 如果环境变量未设置，使用默认值
    pub fn from_env() -> Self {
        Self {
            work_dir: std::env::var("WORK_DIR").unwrap_or_else(|_| "/var/lib/buvette/pager".into()),
            http_port: std::env::var("HTTP_PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(3000),
            environment: std::env::var("ENVIRONMENT").unwrap_or_else(|_| "development".into()),
            fcm_endpoint: std::env::var("FCM_ENDPOINT")
                .unwrap_or_else(|_| "https://fcm.googleapis.com/fcm/send".into()),
            fcm_server_key: std::env::var("FCM_SERVER_KEY").unwrap_or_default(),
            escalation_tick_ms: std::env::var("ESCALATION_TICK_MS")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(5000),
            bus_capacity: std::env::var("BUS_CAPACITY")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(1024),
            log_dir: std::env::var("LOG_DIR").ok().filter(|d| !d.is_empty()),
        }
    }

    /// 使用自定义值覆盖部分配置
    ///
    /// 常用于测试场景
    pub fn with_overrides(work_dir: impl Into<String>, http_port: u16) -> Self {
        let mut config = Self::from_env();
        config.work_dir = work_dir.into();
        config.http_port = http_port;
        config
    }

    /// 数据库文件路径
    pub fn database_path(&self) -> std::path::PathBuf {
        std::path::PathBuf::from(&self.work_dir).join("pager.db")
    }

    /// 确保工作目录存在
    pub fn ensure_work_dir(&self) -> std::io::Result<()> {
        std::fs::create_dir_all(&self.work_dir)
    }

    /// 是否生产环境
    pub fn is_production(&self) -> bool {
        self.environment == "production"
    }

    /// 是否开发环境
    pub fn is_development(&self) -> bool {
        self.environment == "development"
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::from_env()
    }
}
