use actix_web::{HttpResponse, Responder, get, web};

use crate::app_state::AppState;

/// 根路径健康检查/服务说明
#[get("/")]
pub async fn hello(data: web::Data<AppState>) -> impl Responder {
    HttpResponse::Ok().json(serde_json::json!({
        "message": "体积模拟播放服务",
        "endpoints": [
            "POST /simulation/load {\"path\": \"<descriptor>\"}",
            "POST /simulation/cancel",
            "GET /simulation/status",
            "POST /simulation/play",
            "POST /simulation/stop",
            "POST /simulation/reset",
            "GET /simulation/frame",
            "GET /simulation/frame/slice?z=<index>",
            "GET /simulation/voxel?x=<x>&y=<y>&z=<z>",
            "GET /performance?session_id=<task_id>",
        ],
        "resource_dir": data.config.resource_dir.display().to_string(),
        "missing_frames": data.config.missing_frames,
        "tick_hz": data.config.tick_hz,
    }))
}
