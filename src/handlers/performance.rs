use actix_web::{HttpResponse, Responder, get, web};
use serde::Deserialize;

use crate::app_state::AppState;

#[derive(Deserialize)]
pub struct PerformanceQuery {
    /// 加载任务 ID
    pub session_id: String,
}

/// 获取指定加载任务的逐帧耗时
#[get("/performance")]
pub async fn get_performance(
    data: web::Data<AppState>,
    query: web::Query<PerformanceQuery>,
) -> impl Responder {
    let records = data.performance_store.get_records(&query.session_id);
    tracing::debug!(
        session_id = %query.session_id,
        records = records.as_ref().map(|r| r.len()).unwrap_or(0),
        "查询性能数据"
    );

    // 没有记录时返回空数组而不是 404
    HttpResponse::Ok().json(serde_json::json!({
        "session_id": query.session_id,
        "records": records.unwrap_or_default(),
    }))
}
