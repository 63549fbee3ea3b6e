use actix_web::web;

use crate::handlers;

/// 统一注册 HTTP 路由，方便集中管理
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(handlers::hello)
        .service(handlers::load_simulation)
        .service(handlers::cancel_load)
        .service(handlers::get_status)
        .service(handlers::play)
        .service(handlers::stop)
        .service(handlers::reset)
        .service(handlers::get_frame_slice)
        .service(handlers::get_frame)
        .service(handlers::get_voxel)
        .service(handlers::get_performance);
}
