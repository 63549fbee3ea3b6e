use actix_web::{HttpResponse, Responder, get, post, web};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::app_state::AppState;
use crate::error::LoadError;
use crate::simulation::{MissingFramePolicy, SimulationStatus};

#[derive(Deserialize)]
pub struct LoadRequest {
    /// 描述文件路径，相对路径基于资源目录
    pub path: String,
    /// 覆盖默认的缺帧策略
    pub missing_frames: Option<MissingFramePolicy>,
}

#[derive(Serialize)]
struct StatusResponse {
    #[serde(flatten)]
    status: SimulationStatus,
    /// 最近 tick 的平均频率
    tick_rate: f32,
}

fn status_response(data: &AppState) -> HttpResponse {
    HttpResponse::Ok().json(StatusResponse {
        status: data.simulation.status(),
        tick_rate: data.frame_timer.lock().rate(),
    })
}

/// 请求加载模拟，立即返回任务 ID，加载在后台进行
#[post("/simulation/load")]
pub async fn load_simulation(
    data: web::Data<AppState>,
    payload: web::Json<LoadRequest>,
) -> impl Responder {
    match data.request_load(&payload.path, payload.missing_frames) {
        Ok((task_id, descriptor)) => HttpResponse::Accepted().json(serde_json::json!({
            "task_id": task_id,
            "path": descriptor.display().to_string(),
        })),
        Err(LoadError::AlreadyLoading) => HttpResponse::Conflict().json(serde_json::json!({
            "error": "已有模拟正在加载",
            "task_id": data.task_store.current_id(),
        })),
        Err(e) => HttpResponse::InternalServerError().json(serde_json::json!({
            "error": "启动加载失败",
            "details": e.to_string(),
        })),
    }
}

/// 取消正在进行的加载
#[post("/simulation/cancel")]
pub async fn cancel_load(data: web::Data<AppState>) -> impl Responder {
    match data.task_store.cancel_current() {
        Some(task_id) => HttpResponse::Accepted().json(serde_json::json!({
            "task_id": task_id,
            "status": "cancelling",
        })),
        None => HttpResponse::NotFound().json(serde_json::json!({
            "error": "没有正在进行的加载",
        })),
    }
}

/// 加载进度与播放状态，前端每帧轮询
#[get("/simulation/status")]
pub async fn get_status(data: web::Data<AppState>) -> impl Responder {
    status_response(&data)
}

#[post("/simulation/play")]
pub async fn play(data: web::Data<AppState>) -> impl Responder {
    match data.simulation.play() {
        Ok(()) => {
            info!("开始播放模拟");
            status_response(&data)
        }
        Err(e) => HttpResponse::Conflict().json(serde_json::json!({
            "error": e.to_string(),
        })),
    }
}

#[post("/simulation/stop")]
pub async fn stop(data: web::Data<AppState>) -> impl Responder {
    data.simulation.stop();
    status_response(&data)
}

#[post("/simulation/reset")]
pub async fn reset(data: web::Data<AppState>) -> impl Responder {
    data.simulation.reset();
    status_response(&data)
}
