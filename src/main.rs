mod app_state;
mod config;
mod error;
mod handlers;
mod parsers;
mod performance;
mod routes;
mod simulation;
mod task;
mod voxel_grid;

#[cfg(test)]
mod test_support;

use std::time::Duration;

use actix_web::{App, HttpServer, web};
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use app_state::AppState;
use config::Config;

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = match Config::from_env() {
        Ok(config) => config,
        Err(e) => {
            error!(error = %e, "配置无效");
            return Err(std::io::Error::new(std::io::ErrorKind::InvalidInput, e));
        }
    };

    let app_state = web::Data::new(AppState::new(config.clone()));

    // 播放 tick 循环：推进播放并把当前帧上传到暂存体积
    actix_web::rt::spawn(simulation::run_ticker(
        app_state.simulation.clone(),
        app_state.staging.clone(),
        app_state.frame_timer.clone(),
        config.tick_period(),
    ));

    // 定期清理过期的性能记录
    let performance_store = app_state.performance_store.clone();
    actix_web::rt::spawn(async move {
        let mut interval = actix_web::rt::time::interval(Duration::from_secs(5 * 60));
        loop {
            interval.tick().await;
            let cleaned_count = performance_store.cleanup_expired();
            if cleaned_count > 0 {
                info!(
                    cleaned = cleaned_count,
                    remaining = performance_store.session_count(),
                    "清理过期的性能记录"
                );
            }
        }
    });

    if let Some(path) = &config.autoload {
        match app_state.request_load(path, None) {
            Ok((task_id, descriptor)) => {
                info!(task_id = %task_id, path = %descriptor.display(), "启动时自动加载模拟");
            }
            Err(e) => warn!(error = %e, "自动加载失败"),
        }
    }

    info!(
        addr = %format!("http://{}:{}", config.bind_addr, config.port),
        resource_dir = %config.resource_dir.display(),
        tick_hz = config.tick_hz,
        missing_frames = ?config.missing_frames,
        ttl_minutes = app_state.performance_store.default_ttl().as_secs() / 60,
        "服务器启动"
    );

    let server_state = app_state.clone();
    let result = HttpServer::new(move || {
        App::new()
            .app_data(server_state.clone())
            .configure(routes::configure)
    })
    .bind((config.bind_addr.as_str(), config.port))?
    .run()
    .await;

    // 关闭前取消并等待仍在运行的加载任务
    if let Some(task) = app_state.task_store.take() {
        if !task.is_finished() {
            info!(
                task_id = %task.id,
                path = %task.path.display(),
                running_ms = task.created_at.elapsed().as_millis() as u64,
                "取消并等待加载任务结束"
            );
            task.cancel();
        }
        if let Err(e) = task.join().await {
            warn!(error = %e, "加载任务未正常完成");
        }
    }

    result
}
