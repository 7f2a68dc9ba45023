//! Server Implementation
//!
//! HTTP 服务器启动和管理

use std::time::Duration;

use crate::api;
use crate::core::{BackgroundTasks, Config, ServerState, TaskKind};
use crate::lifecycle::EscalationScheduler;

/// HTTP Server
pub struct Server {
    config: Config,
    state: Option<ServerState>,
}

impl Server {
    pub fn new(config: Config) -> Self {
        Self {
            config,
            state: None,
        }
    }

    /// Create server with existing state (tests inject a state with a
    /// mock push sender this way)
    pub fn with_state(config: Config, state: ServerState) -> Self {
        Self {
            config,
            state: Some(state),
        }
    }

    pub async fn run(&self) -> anyhow::Result<()> {
        // Create application state if not provided
        let state = match &self.state {
            Some(s) => s.clone(),
            None => ServerState::initialize(&self.config).await,
        };

        // Start background tasks (escalation scheduler)
        let mut tasks = BackgroundTasks::new();
        let scheduler = EscalationScheduler::new(
            state.engine.clone(),
            Duration::from_millis(self.config.escalation_tick_ms),
            tasks.shutdown_token(),
        );
        tasks.spawn("escalation_scheduler", TaskKind::Periodic, scheduler.run());

        let app = api::build_app(&state);

        let addr = std::net::SocketAddr::from(([0, 0, 0, 0], self.config.http_port));
        tracing::info!("Buvette Pager Server starting on {}", addr);

        let listener = tokio::net::TcpListener::bind(addr).await?;
        axum::serve(listener, app)
            .with_graceful_shutdown(async {
                let _ = tokio::signal::ctrl_c().await;
                tracing::info!("Shutting down...");
            })
            .await?;

        tasks.shutdown().await;

        Ok(())
    }
}
