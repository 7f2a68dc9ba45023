//! Orders API Module
//!
//! | 路径 | 方法 | 说明 |
//! |------|------|------|
//! | /api/orders | GET | 列出订单 (可按状态过滤) |
//! | /api/orders | POST | 创建订单 (服务器生成 PIN) |
//! | /api/orders/{id} | GET/PUT/DELETE | 单个订单 |
//! | /api/orders/{id}/validate | POST | 草稿确认 (client_draft → pending) |
//! | /api/orders/by-pin/{pin} | GET | 按 PIN 查找活跃订单 |

mod handler;

use axum::{
    Router,
    routing::{get, post},
};

use crate::core::ServerState;

/// Orders router
pub fn router() -> Router<ServerState> {
    Router::new().nest("/api/orders", routes())
}

fn routes() -> Router<ServerState> {
    Router::new()
        .route("/", get(handler::list).post(handler::create))
        .route(
            "/{id}",
            get(handler::get_by_id)
                .put(handler::update)
                .delete(handler::remove),
        )
        .route("/{id}/validate", post(handler::validate))
        .route("/by-pin/{pin}", get(handler::get_by_pin))
}
