use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use chrono::{Duration, TimeZone, Utc};
use hmac::{Hmac, Mac};
use serde_json::json;
use sha2::Sha256;
use tracing::debug;
use uuid::Uuid;

use shared_models::auth::{IssuedToken, JwtClaims, Role, User};

type HmacSha256 = Hmac<Sha256>;

/// Signs an HS256 token for an authenticated account.
pub fn issue_token(
    account_id: Uuid,
    username: &str,
    role: Role,
    jwt_secret: &str,
    ttl_hours: i64,
) -> Result<IssuedToken, String> {
    if jwt_secret.is_empty() {
        return Err("JWT secret is not set".to_string());
    }

    let now = Utc::now();
    let expires_at = Duration::try_hours(ttl_hours)
        .and_then(|ttl| now.checked_add_signed(ttl))
        .ok_or_else(|| format!("Token lifetime of {} hours is out of range", ttl_hours))?;

    let header = json!({ "alg": "HS256", "typ": "JWT" });
    let claims = JwtClaims {
        sub: account_id.to_string(),
        username: username.to_string(),
        role,
        iat: now.timestamp().max(0) as u64,
        exp: expires_at.timestamp().max(0) as u64,
    };
    let claims_json = serde_json::to_string(&claims)
        .map_err(|e| format!("Failed to encode claims: {}", e))?;

    let signing_input = format!(
        "{}.{}",
        URL_SAFE_NO_PAD.encode(header.to_string()),
        URL_SAFE_NO_PAD.encode(claims_json),
    );

    let mut mac = HmacSha256::new_from_slice(jwt_secret.as_bytes())
        .map_err(|_| "Failed to create HMAC".to_string())?;
    mac.update(signing_input.as_bytes());
    let signature = URL_SAFE_NO_PAD.encode(mac.finalize().into_bytes());

    debug!("Issued token for account {}", account_id);
    Ok(IssuedToken {
        token: format!("{}.{}", signing_input, signature),
        expires_at,
    })
}

pub fn validate_token(token: &str, jwt_secret: &str) -> Result<User, String> {
    if jwt_secret.is_empty() {
        return Err("JWT secret is not set".to_string());
    }

    // Split token into parts
    let parts: Vec<&str> = token.split('.').collect();
    if parts.len() != 3 {
        return Err("Invalid token format".to_string());
    }

    let header_b64 = parts[0];
    let claims_b64 = parts[1];
    let signature_b64 = parts[2];

    let signature = match URL_SAFE_NO_PAD.decode(signature_b64) {
        Ok(sig) => sig,
        Err(e) => {
            debug!("Failed to decode signature: {}", e);
            return Err("Invalid signature encoding".to_string());
        }
    };

    let signature_string = format!("{}.{}", header_b64, claims_b64);

    let mut mac = match HmacSha256::new_from_slice(jwt_secret.as_bytes()) {
        Ok(m) => m,
        Err(_) => return Err("Failed to create HMAC".to_string()),
    };

    mac.update(signature_string.as_bytes());

    if mac.verify_slice(&signature).is_err() {
        debug!("Token signature verification failed");
        return Err("Invalid token signature".to_string());
    }

    let claims_json = match URL_SAFE_NO_PAD.decode(claims_b64) {
        Ok(bytes) => match String::from_utf8(bytes) {
            Ok(json_str) => json_str,
            Err(_) => return Err("Invalid claims encoding".to_string()),
        },
        Err(_) => return Err("Invalid claims encoding".to_string()),
    };

    let claims: JwtClaims = match serde_json::from_str(&claims_json) {
        Ok(c) => c,
        Err(e) => {
            debug!("Failed to parse claims: {}", e);
            return Err("Invalid claims format".to_string());
        },
    };

    let now = Utc::now().timestamp().max(0) as u64;
    if claims.exp < now {
        debug!("Token expired at {} (now: {})", claims.exp, now);
        return Err("Token expired".to_string());
    }

    let id = Uuid::parse_str(&claims.sub)
        .map_err(|_| "Invalid token subject".to_string())?;

    let user = User {
        id,
        username: claims.username,
        role: claims.role,
        issued_at: Utc.timestamp_opt(claims.iat as i64, 0).single(),
    };

    debug!("Token validated successfully for user: {}", user.id);
    Ok(user)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &str = "test-secret";

    #[test]
    fn issued_token_validates() {
        let id = Uuid::new_v4();
        let issued = issue_token(id, "dr.khan", Role::Doctor, SECRET, 1).unwrap();
        let user = validate_token(&issued.token, SECRET).unwrap();

        assert_eq!(user.id, id);
        assert_eq!(user.username, "dr.khan");
        assert_eq!(user.role, Role::Doctor);
        assert!(issued.expires_at > Utc::now());
    }

    #[test]
    fn wrong_secret_is_rejected() {
        let issued = issue_token(Uuid::new_v4(), "amina", Role::Patient, SECRET, 1).unwrap();
        assert_eq!(
            validate_token(&issued.token, "other-secret").unwrap_err(),
            "Invalid token signature"
        );
    }

    #[test]
    fn expired_token_is_rejected() {
        let issued = issue_token(Uuid::new_v4(), "amina", Role::Patient, SECRET, -1).unwrap();
        assert_eq!(validate_token(&issued.token, SECRET).unwrap_err(), "Token expired");
    }

    #[test]
    fn oversized_lifetime_is_an_error() {
        let result = issue_token(Uuid::new_v4(), "amina", Role::Patient, SECRET, i64::MAX / 1000);
        assert!(result.unwrap_err().contains("out of range"));

        let result = issue_token(Uuid::new_v4(), "amina", Role::Patient, SECRET, 50_000_000_000);
        assert!(result.is_err());
    }

    #[test]
    fn issuing_requires_a_secret() {
        assert!(issue_token(Uuid::new_v4(), "amina", Role::Patient, "", 1).is_err());
    }
}
