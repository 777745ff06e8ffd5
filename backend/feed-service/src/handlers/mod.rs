pub mod feed;
pub mod fork;
pub mod intent;

use actix_web::web;

use crate::error::AppError;
use crate::middleware::JwtAuthMiddleware;

pub use feed::{get_feed, update_session};
pub use fork::{create_fork, get_children, get_fork, interact, report};
pub use intent::get_intents;

/// Mount the authenticated `/api/v1` surface.
///
/// Callers register `web::Data<FeedService>` and `web::Data<ForkService>`
/// on the app.
pub fn configure_api(cfg: &mut web::ServiceConfig, auth: JwtAuthMiddleware) {
    let json_cfg = web::JsonConfig::default()
        .limit(16 * 1024)
        .error_handler(|err, _req| {
            tracing::debug!("Rejected request body: {}", err);
            AppError::BadRequest("invalid request body".to_string()).into()
        });

    cfg.service(
        web::scope("/api/v1")
            .wrap(auth)
            .app_data(json_cfg)
            .service(get_feed)
            .service(update_session)
            .service(create_fork)
            .service(get_children)
            .service(get_fork)
            .service(interact)
            .service(report)
            .service(get_intents),
    );
}
