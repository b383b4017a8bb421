use axum::{
    extract::Request,
    http::StatusCode,
    middleware::Next,
    response::{IntoResponse, Json, Response},
};
use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use serde::{Deserialize, Serialize};
use serde_json::json;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    pub exp: usize,
    pub role: Option<String>,
}

impl Claims {
    /// The verified user id every core operation is scoped by.
    pub fn user_id(&self) -> crate::error::Result<Uuid> {
        Uuid::parse_str(&self.sub)
            .map_err(|_| crate::error::Error::Unauthorized("Invalid token subject".to_string()))
    }
}

fn reject(code: &str) -> Response {
    (
        StatusCode::UNAUTHORIZED,
        Json(json!({"error": {"code": "UNAUTHORIZED", "message": code}})),
    )
        .into_response()
}

pub async fn require_bearer_auth(mut req: Request, next: Next) -> Response {
    let Some(auth_header) = req.headers().get(axum::http::header::AUTHORIZATION) else {
        return reject("missing_authorization");
    };
    let Ok(auth_str) = auth_header.to_str() else {
        return reject("bad_authorization");
    };
    let Some(token) = auth_str.strip_prefix("Bearer ") else {
        return reject("unsupported_scheme");
    };

    let config = crate::config::get_config();
    let mut validation = Validation::new(Algorithm::HS256);
    validation.validate_exp = true;
    match decode::<Claims>(
        token,
        &DecodingKey::from_secret(config.jwt_secret.as_bytes()),
        &validation,
    ) {
        Ok(data) => {
            req.extensions_mut().insert(data.claims);
            next.run(req).await
        }
        Err(err) => {
            let code = match err.kind() {
                jsonwebtoken::errors::ErrorKind::ExpiredSignature => "expired_token",
                _ => "invalid_token",
            };
            reject(code)
        }
    }
}
