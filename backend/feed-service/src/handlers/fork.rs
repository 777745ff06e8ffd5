use actix_web::{get, post, web, HttpResponse};
use serde::Deserialize;
use uuid::Uuid;

use crate::error::{AppError, Result};
use crate::middleware::ActorId;
use crate::models::{CreateForkInput, ForkResponse};
use crate::services::ForkService;

#[derive(Debug, Deserialize)]
pub struct InteractRequest {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub dwell_ms: Option<i32>,
}

#[derive(Debug, Deserialize)]
pub struct ReportRequest {
    pub reason: String,
}

fn parse_fork_id(raw: &str) -> Result<Uuid> {
    Uuid::parse_str(raw).map_err(|_| AppError::BadRequest("invalid fork id".to_string()))
}

fn ok_status() -> HttpResponse {
    HttpResponse::Ok().json(serde_json::json!({ "status": "ok" }))
}

#[post("/forks")]
pub async fn create_fork(
    actor: ActorId,
    body: web::Json<CreateForkInput>,
    forks: web::Data<ForkService>,
) -> Result<HttpResponse> {
    let fork = forks.create_fork(actor.0, body.into_inner()).await?;
    Ok(HttpResponse::Created().json(ForkResponse::from(fork)))
}

#[get("/forks/{id}")]
pub async fn get_fork(
    path: web::Path<String>,
    forks: web::Data<ForkService>,
) -> Result<HttpResponse> {
    let id = parse_fork_id(&path)?;
    let fork = forks.get_fork(id).await?;
    Ok(HttpResponse::Ok().json(ForkResponse::from(fork)))
}

#[get("/forks/{id}/children")]
pub async fn get_children(
    path: web::Path<String>,
    forks: web::Data<ForkService>,
) -> Result<HttpResponse> {
    let id = parse_fork_id(&path)?;
    let children: Vec<ForkResponse> = forks
        .get_children(id)
        .await?
        .into_iter()
        .map(ForkResponse::from)
        .collect();
    Ok(HttpResponse::Ok().json(serde_json::json!({ "forks": children })))
}

#[post("/forks/{id}/interact")]
pub async fn interact(
    actor: ActorId,
    path: web::Path<String>,
    body: web::Json<InteractRequest>,
    forks: web::Data<ForkService>,
) -> Result<HttpResponse> {
    let fork_id = parse_fork_id(&path)?;
    forks
        .record_interaction(actor.0, fork_id, &body.kind, body.dwell_ms)
        .await?;
    Ok(ok_status())
}

#[post("/forks/{id}/report")]
pub async fn report(
    actor: ActorId,
    path: web::Path<String>,
    body: web::Json<ReportRequest>,
    forks: web::Data<ForkService>,
) -> Result<HttpResponse> {
    let fork_id = parse_fork_id(&path)?;
    forks.report_fork(actor.0, fork_id, &body.reason).await?;
    Ok(ok_status())
}
