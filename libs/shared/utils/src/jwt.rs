use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use chrono::{Duration, Utc};
use hmac::{Hmac, Mac};
use sha2::Sha256;
use tracing::debug;
use uuid::Uuid;

use shared_models::auth::{AuthUser, JwtClaims, Role};

type HmacSha256 = Hmac<Sha256>;

pub const TOKEN_TYPE_ACCESS: &str = "access";
pub const TOKEN_TYPE_REFRESH: &str = "refresh";

/// Sign a claims set as a compact HS256 JWT.
pub fn encode_token(claims: &JwtClaims, jwt_secret: &str) -> Result<String, String> {
    if jwt_secret.is_empty() {
        return Err("JWT secret is not set".to_string());
    }

    let header = serde_json::json!({ "alg": "HS256", "typ": "JWT" });
    let claims_json =
        serde_json::to_string(claims).map_err(|e| format!("Failed to encode claims: {}", e))?;

    let header_b64 = URL_SAFE_NO_PAD.encode(header.to_string());
    let claims_b64 = URL_SAFE_NO_PAD.encode(claims_json);
    let signing_input = format!("{}.{}", header_b64, claims_b64);

    let mut mac = HmacSha256::new_from_slice(jwt_secret.as_bytes())
        .map_err(|_| "Failed to create HMAC".to_string())?;
    mac.update(signing_input.as_bytes());
    let signature = URL_SAFE_NO_PAD.encode(mac.finalize().into_bytes());

    Ok(format!("{}.{}", signing_input, signature))
}

/// Build the claims for a token of the given type and lifetime.
pub fn build_claims(user: &AuthUser, token_type: &str, lifetime: Duration) -> JwtClaims {
    let now = Utc::now();
    JwtClaims {
        sub: user.id.to_string(),
        username: user.username.clone(),
        email: user.email.clone(),
        role: user.role.to_string(),
        staff: user.is_staff,
        typ: token_type.to_string(),
        iat: now.timestamp(),
        exp: (now + lifetime).timestamp(),
    }
}

/// Verify signature and expiry, returning the raw claims.
pub fn decode_token(token: &str, jwt_secret: &str) -> Result<JwtClaims, String> {
    if jwt_secret.is_empty() {
        return Err("JWT secret is not set".to_string());
    }

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

    let signing_input = format!("{}.{}", header_b64, claims_b64);

    let mut mac = HmacSha256::new_from_slice(jwt_secret.as_bytes())
        .map_err(|_| "Failed to create HMAC".to_string())?;
    mac.update(signing_input.as_bytes());

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
        }
    };

    let now = Utc::now().timestamp();
    if claims.exp < now {
        debug!("Token expired at {} (now: {})", claims.exp, now);
        return Err("Token expired".to_string());
    }

    Ok(claims)
}

/// Validate an access token and resolve the authenticated actor.
pub fn validate_access_token(token: &str, jwt_secret: &str) -> Result<AuthUser, String> {
    let claims = decode_token(token, jwt_secret)?;

    if claims.typ != TOKEN_TYPE_ACCESS {
        return Err("Not an access token".to_string());
    }

    auth_user_from_claims(&claims)
}

/// Validate a refresh token, returning its claims so a fresh access token
/// can be minted for the same actor.
pub fn validate_refresh_token(token: &str, jwt_secret: &str) -> Result<AuthUser, String> {
    let claims = decode_token(token, jwt_secret)?;

    if claims.typ != TOKEN_TYPE_REFRESH {
        return Err("Not a refresh token".to_string());
    }

    auth_user_from_claims(&claims)
}

fn auth_user_from_claims(claims: &JwtClaims) -> Result<AuthUser, String> {
    let id = Uuid::parse_str(&claims.sub).map_err(|_| "Invalid subject claim".to_string())?;
    let role = Role::parse(&claims.role).ok_or_else(|| "Invalid role claim".to_string())?;

    let user = AuthUser {
        id,
        username: claims.username.clone(),
        email: claims.email.clone(),
        role,
        is_staff: claims.staff,
    };

    debug!("Token validated successfully for user: {}", user.id);
    Ok(user)
}
