use crate::error::{Error, Result};
use crate::middleware::auth::Claims;
use chrono::{Duration, Utc};
use jsonwebtoken::{encode, EncodingKey, Header};
use uuid::Uuid;

/// Mint the bearer credential carried by every authenticated request.
pub fn issue_token(user_id: Uuid, role: &str) -> Result<String> {
    let config = crate::config::get_config();
    issue_token_with(user_id, role, &config.jwt_secret, config.jwt_ttl_hours)
}

pub fn issue_token_with(user_id: Uuid, role: &str, secret: &str, ttl_hours: i64) -> Result<String> {
    let expires_at = Utc::now() + Duration::hours(ttl_hours);
    let claims = Claims {
        sub: user_id.to_string(),
        exp: expires_at.timestamp() as usize,
        role: Some(role.to_string()),
    };
    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .map_err(|e| Error::Internal(format!("Failed to sign token: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};

    #[test]
    fn issued_token_decodes_to_the_same_subject() {
        let user_id = Uuid::new_v4();
        let token = issue_token_with(user_id, "student", "test_secret", 1).unwrap();

        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = true;
        let data = decode::<Claims>(
            &token,
            &DecodingKey::from_secret(b"test_secret"),
            &validation,
        )
        .unwrap();

        assert_eq!(data.claims.sub, user_id.to_string());
        assert_eq!(data.claims.role.as_deref(), Some("student"));
    }

    #[test]
    fn token_signed_with_other_secret_is_rejected() {
        let token = issue_token_with(Uuid::new_v4(), "student", "secret_a", 1).unwrap();
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = true;
        assert!(
            decode::<Claims>(&token, &DecodingKey::from_secret(b"secret_b"), &validation).is_err()
        );
    }
}
