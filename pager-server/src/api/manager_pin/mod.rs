//! Manager PIN API Module
//!
//! | 路径 | 方法 | 说明 |
//! |------|------|------|
//! | /api/manager-pin | GET | 读取 (首次访问时创建默认值) |
//! | /api/manager-pin | PUT | 设置 (setManagerPin) |

mod handler;

use axum::{Router, routing::get};

use crate::core::ServerState;

/// Manager PIN router
pub fn router() -> Router<ServerState> {
    Router::new().nest("/api/manager-pin", routes())
}

fn routes() -> Router<ServerState> {
    Router::new().route("/", get(handler::get).put(handler::set))
}
