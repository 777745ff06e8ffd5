use actix_web::{get, put, web, HttpResponse};
use serde::Deserialize;
use tracing::debug;

use crate::error::Result;
use crate::middleware::ActorId;
use crate::models::{FeedResponse, Session};
use crate::services::FeedService;

/// Query string for `GET /feed`. Everything is optional and read as text so
/// that junk values fall back to defaults instead of failing extraction.
#[derive(Debug, Deserialize)]
pub struct FeedQueryParams {
    pub lane: Option<String>,
    pub energy: Option<String>,
    pub cursor: Option<String>,
    pub limit: Option<String>,
}

impl FeedQueryParams {
    fn limit(&self) -> Option<i64> {
        self.limit.as_deref().and_then(|l| l.trim().parse().ok())
    }

    fn session(&self) -> Session {
        Session::from_raw(self.lane.as_deref(), self.energy.as_deref())
    }
}

#[derive(Debug, Deserialize)]
pub struct UpdateSessionRequest {
    #[serde(default)]
    pub lane: Option<String>,
    #[serde(default)]
    pub energy: Option<String>,
}

#[get("/feed")]
pub async fn get_feed(
    actor: ActorId,
    query: web::Query<FeedQueryParams>,
    feed: web::Data<FeedService>,
) -> Result<HttpResponse> {
    let mut session = query.session();
    if session.is_empty() {
        session = feed.get_session(actor.0).await;
    }

    debug!(
        actor_id = %actor.0,
        lane = ?session.lane,
        energy = ?session.energy,
        "Serving feed"
    );

    let page = feed
        .get_feed(actor.0, &session, query.cursor.as_deref(), query.limit())
        .await?;

    Ok(HttpResponse::Ok().json(FeedResponse::from(page)))
}

#[put("/session")]
pub async fn update_session(
    actor: ActorId,
    body: web::Json<UpdateSessionRequest>,
    feed: web::Data<FeedService>,
) -> Result<HttpResponse> {
    let session = Session::from_raw(body.lane.as_deref(), body.energy.as_deref());
    feed.update_session(actor.0, &session).await?;

    Ok(HttpResponse::Ok().json(serde_json::json!({ "status": "ok" })))
}
