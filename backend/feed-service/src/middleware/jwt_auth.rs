use actix_web::{
    dev::{forward_ready, Service, ServiceRequest, ServiceResponse, Transform},
    Error, HttpMessage,
};
use futures::future::{ready, Ready};
use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::pin::Pin;
use std::rc::Rc;
use std::sync::Arc;
use uuid::Uuid;

use crate::error::AppError;

/// Actor id taken from a verified bearer token
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ActorId(pub Uuid);

/// Device token claims; `sub` is the actor id
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    pub exp: usize,
}

/// HS256 bearer-token middleware
#[derive(Clone)]
pub struct JwtAuthMiddleware {
    key: Arc<DecodingKey>,
}

impl JwtAuthMiddleware {
    pub fn new(secret: &str) -> Self {
        Self {
            key: Arc::new(DecodingKey::from_secret(secret.as_bytes())),
        }
    }
}

fn verify(key: &DecodingKey, header: Option<&str>) -> Result<ActorId, AppError> {
    let header =
        header.ok_or_else(|| AppError::Unauthorized("missing authorization header".into()))?;

    let token = header
        .strip_prefix("Bearer ")
        .ok_or_else(|| AppError::Unauthorized("invalid authorization header format".into()))?;

    let token_data =
        decode::<Claims>(token, key, &Validation::new(Algorithm::HS256)).map_err(|e| {
            tracing::warn!("JWT validation failed: {}", e);
            AppError::Unauthorized("invalid token".into())
        })?;

    let actor_id = Uuid::parse_str(&token_data.claims.sub).map_err(|e| {
        tracing::warn!("Invalid actor id in token: {}", e);
        AppError::Unauthorized("invalid token: malformed subject".into())
    })?;

    Ok(ActorId(actor_id))
}

impl<S, B> Transform<S, ServiceRequest> for JwtAuthMiddleware
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Transform = JwtAuthMiddlewareService<S>;
    type InitError = ();
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(JwtAuthMiddlewareService {
            service: Rc::new(service),
            key: self.key.clone(),
        }))
    }
}

pub struct JwtAuthMiddlewareService<S> {
    service: Rc<S>,
    key: Arc<DecodingKey>,
}

impl<S, B> Service<ServiceRequest> for JwtAuthMiddlewareService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>>>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let service = self.service.clone();
        let key = self.key.clone();

        Box::pin(async move {
            let header = req
                .headers()
                .get("Authorization")
                .and_then(|h| h.to_str().ok());

            let actor_id = verify(&key, header)?;
            req.extensions_mut().insert(actor_id);

            service.call(req).await
        })
    }
}

impl actix_web::FromRequest for ActorId {
    type Error = actix_web::Error;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(
        req: &actix_web::HttpRequest,
        _payload: &mut actix_web::dev::Payload,
    ) -> Self::Future {
        match req.extensions().get::<ActorId>() {
            Some(actor_id) => ready(Ok(*actor_id)),
            None => ready(Err(
                AppError::Unauthorized("actor not authenticated".into()).into()
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::{test, web, App, HttpResponse};
    use jsonwebtoken::{encode, EncodingKey, Header};

    const SECRET: &str = "unit-test-secret";

    fn token(sub: &str, secret: &str) -> String {
        let claims = Claims {
            sub: sub.to_string(),
            exp: (chrono::Utc::now().timestamp() + 3600) as usize,
        };
        encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(secret.as_bytes()),
        )
        .unwrap()
    }

    async fn whoami(actor: ActorId) -> HttpResponse {
        HttpResponse::Ok().body(actor.0.to_string())
    }

    #[actix_web::test]
    async fn test_valid_token_sets_actor() {
        let actor = Uuid::new_v4();
        let app = test::init_service(
            App::new()
                .wrap(JwtAuthMiddleware::new(SECRET))
                .route("/me", web::get().to(whoami)),
        )
        .await;

        let header = format!("Bearer {}", token(&actor.to_string(), SECRET));
        let req = test::TestRequest::get()
            .uri("/me")
            .insert_header(("Authorization", header))
            .to_request();
        let body = test::call_and_read_body(&app, req).await;
        assert_eq!(body, actor.to_string());
    }

    #[actix_web::test]
    async fn test_missing_header_is_unauthorized() {
        let app = test::init_service(
            App::new()
                .wrap(JwtAuthMiddleware::new(SECRET))
                .route("/me", web::get().to(whoami)),
        )
        .await;

        let req = test::TestRequest::get().uri("/me").to_request();
        let err = test::try_call_service(&app, req).await.unwrap_err();
        assert_eq!(err.as_response_error().status_code(), 401);
    }

    #[::core::prelude::v1::test]
    fn test_verify_rejects_bad_tokens() {
        let key = DecodingKey::from_secret(SECRET.as_bytes());
        let actor = Uuid::new_v4().to_string();

        assert!(verify(&key, Some(&format!("Token {}", token(&actor, SECRET)))).is_err());
        assert!(verify(&key, Some(&format!("Bearer {}", token(&actor, "other")))).is_err());
        assert!(verify(&key, Some(&format!("Bearer {}", token("device-7", SECRET)))).is_err());
        assert!(verify(&key, Some(&format!("Bearer {}", token(&actor, SECRET)))).is_ok());
    }
}
