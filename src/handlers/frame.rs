use actix_web::{HttpResponse, Responder, get, http::header::ContentType, web};
use glam::Vec3;
use serde::Deserialize;

use crate::app_state::AppState;
use crate::simulation::StagingVolume;

#[derive(Deserialize)]
pub struct SliceQuery {
    pub z: usize,
}

#[derive(Deserialize)]
pub struct VoxelQuery {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

fn not_loaded() -> HttpResponse {
    HttpResponse::NotFound().json(serde_json::json!({
        "error": "没有可显示的模拟帧",
    }))
}

fn octet_response(volume: &StagingVolume, frame_index: usize, bytes: Vec<u8>) -> HttpResponse {
    let [width, height, depth] = volume.shape();
    HttpResponse::Ok()
        .content_type(ContentType::octet_stream())
        .append_header(("X-Frame-Index", frame_index.to_string()))
        .append_header(("X-Grid-Shape", format!("{},{},{}", width, height, depth)))
        .append_header(("X-Slice-Length", (width * height).to_string()))
        .body(bytes)
}

/// 当前帧的完整体积数据，小端 f32，x 变化最快
#[get("/simulation/frame")]
pub async fn get_frame(data: web::Data<AppState>) -> impl Responder {
    let staging = data.staging.read();
    let Some(volume) = staging.as_ref() else {
        return not_loaded();
    };
    let Some(frame_index) = volume.frame_index() else {
        return not_loaded();
    };

    octet_response(volume, frame_index, volume.to_le_bytes())
}

/// 当前帧的单个深度切片
#[get("/simulation/frame/slice")]
pub async fn get_frame_slice(
    data: web::Data<AppState>,
    query: web::Query<SliceQuery>,
) -> impl Responder {
    let staging = data.staging.read();
    let Some(volume) = staging.as_ref() else {
        return not_loaded();
    };
    let Some(frame_index) = volume.frame_index() else {
        return not_loaded();
    };

    match volume.slice_le_bytes(query.z) {
        Ok(bytes) => octet_response(volume, frame_index, bytes),
        Err(e) => HttpResponse::BadRequest().json(serde_json::json!({
            "error": e.to_string(),
            "z": query.z,
        })),
    }
}

/// 读取当前帧某个位置的密度，坐标向零截断
#[get("/simulation/voxel")]
pub async fn get_voxel(
    data: web::Data<AppState>,
    query: web::Query<VoxelQuery>,
) -> impl Responder {
    let Some((frame_index, grid)) = data.simulation.current_frame_grid() else {
        return not_loaded();
    };

    let pos = Vec3::new(query.x, query.y, query.z);
    match grid.at_vec(pos) {
        Ok(density) => HttpResponse::Ok().json(serde_json::json!({
            "frame": frame_index,
            "position": [pos.x, pos.y, pos.z],
            "density": density,
        })),
        Err(e) => HttpResponse::BadRequest().json(serde_json::json!({
            "error": e.to_string(),
        })),
    }
}

#[cfg(test)]
mod tests {
    use actix_web::{App, http::StatusCode, test};

    use super::*;
    use crate::config::Config;
    use crate::routes;
    use crate::simulation::loader::{LoadContext, MissingFramePolicy, load_simulation};
    use crate::simulation::ticker::tick_once;
    use crate::test_support::TempDir;

    fn loaded_state(dir: &TempDir) -> web::Data<AppState> {
        let values: Vec<f32> = (0..12).map(|v| v as f32).collect();
        let path = dir.write_simulation(1, [3, 2, 2], &[Some(values)]);
        let data = web::Data::new(AppState::new(Config::default()));
        load_simulation(
            &data.simulation,
            &path,
            &LoadContext::new(MissingFramePolicy::Skip),
        )
        .unwrap();
        tick_once(&data.simulation, &data.staging);
        data
    }

    fn decode(bytes: &[u8]) -> Vec<f32> {
        bytes
            .chunks_exact(4)
            .map(|b| f32::from_le_bytes([b[0], b[1], b[2], b[3]]))
            .collect()
    }

    #[actix_web::test]
    async fn serves_whole_frame() {
        let dir = TempDir::new();
        let app = test::init_service(
            App::new()
                .app_data(loaded_state(&dir))
                .configure(routes::configure),
        )
        .await;

        let req = test::TestRequest::get().uri("/simulation/frame").to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);
        let header = |name: &str| resp.headers().get(name).unwrap().to_str().unwrap().to_string();
        assert_eq!(header("X-Grid-Shape"), "3,2,2");
        assert_eq!(header("X-Frame-Index"), "0");
        assert_eq!(header("X-Slice-Length"), "6");
        let body = test::read_body(resp).await;
        let expected: Vec<f32> = (0..12).map(|v| v as f32).collect();
        assert_eq!(decode(&body), expected);
    }

    #[actix_web::test]
    async fn serves_single_slice() {
        let dir = TempDir::new();
        let app = test::init_service(
            App::new()
                .app_data(loaded_state(&dir))
                .configure(routes::configure),
        )
        .await;

        let req = test::TestRequest::get()
            .uri("/simulation/frame/slice?z=1")
            .to_request();
        let body = test::call_and_read_body(&app, req).await;
        assert_eq!(decode(&body), vec![6.0, 7.0, 8.0, 9.0, 10.0, 11.0]);

        let req = test::TestRequest::get()
            .uri("/simulation/frame/slice?z=2")
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }

    #[actix_web::test]
    async fn probes_voxel_with_truncation() {
        let dir = TempDir::new();
        let app = test::init_service(
            App::new()
                .app_data(loaded_state(&dir))
                .configure(routes::configure),
        )
        .await;

        // (2.9, 1.2, 1.0) -> (2, 1, 1) -> 2 + 3 * (1 + 2 * 1) = 11
        let req = test::TestRequest::get()
            .uri("/simulation/voxel?x=2.9&y=1.2&z=1")
            .to_request();
        let body: serde_json::Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["density"], 11.0);
        assert_eq!(body["frame"], 0);

        let req = test::TestRequest::get()
            .uri("/simulation/voxel?x=3&y=0&z=0")
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }

    #[actix_web::test]
    async fn empty_simulation_has_no_frame() {
        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(AppState::new(Config::default())))
                .configure(routes::configure),
        )
        .await;

        let req = test::TestRequest::get().uri("/simulation/frame").to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    }
}
