pub mod jwt_auth;

pub use jwt_auth::{ActorId, Claims, JwtAuthMiddleware};
