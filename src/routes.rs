use std::sync::Arc;

use axum::{
    extract::DefaultBodyLimit,
    http::{header::ACCESS_CONTROL_ALLOW_ORIGIN, HeaderValue},
    routing::post,
    Router,
};
use tower_http::{services::ServeDir, set_header::SetResponseHeader, trace::TraceLayer};

use crate::{config::Config, upload::create_track};

/// `POST /createTrack` plus read access to stored files under `/audio`
/// and `/cover`. Audio responses allow any origin.
pub fn app(config: Arc<Config>) -> Router {
    let audio = SetResponseHeader::overriding(
        ServeDir::new(&config.audio_dir),
        ACCESS_CONTROL_ALLOW_ORIGIN,
        HeaderValue::from_static("*"),
    );
    let cover = ServeDir::new(&config.cover_dir);

    Router::new()
        // fields stream to disk, so the default in-memory body cap does not apply
        .route(
            "/createTrack",
            post(create_track).layer(DefaultBodyLimit::disable()),
        )
        .nest_service("/audio", audio)
        .nest_service("/cover", cover)
        .layer(TraceLayer::new_for_http())
        .with_state(config)
}
