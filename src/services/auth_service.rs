use crate::{models::UserIdentity, utils::AppError};
use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD, Engine};
use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{decode, decode_header, Algorithm, DecodingKey, Validation};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tokio::sync::RwLock;
use x509_parser::prelude::*;

const FIREBASE_ISSUER_PREFIX: &str = "https://securetoken.google.com/";

// Cache-Control max-age bounds for Google's signing keys (seconds)
const MIN_CACHE_TTL_SECS: i64 = 300;
const DEFAULT_CACHE_TTL_SECS: i64 = 3600;

/// Turns a bearer token into a verified user identity.
///
/// Every failure mode (missing, malformed, expired, wrong project, key
/// fetch failure) collapses into `AppError::Unauthenticated`.
#[async_trait]
pub trait IdentityVerifier: Send + Sync {
    async fn verify(&self, token: &str) -> Result<UserIdentity, AppError>;
}

// Firebase ID token claims
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct FirebaseClaims {
    pub sub: String,           // Firebase UID
    pub aud: String,           // project id
    pub iss: String,
    pub iat: i64,
    pub exp: i64,
    #[serde(default)]
    pub email: Option<String>,
}

struct CachedKeys {
    // kid -> PEM public key
    keys: HashMap<String, String>,
    expires_at: DateTime<Utc>,
}

/// Verifies Firebase ID tokens against Google's published signing keys
pub struct FirebaseVerifier {
    project_id: String,
    certs_url: String,
    http_client: reqwest::Client,
    cached_keys: RwLock<Option<CachedKeys>>,
}

impl FirebaseVerifier {
    pub fn new(project_id: String, certs_url: String, http_client: reqwest::Client) -> Self {
        Self {
            project_id,
            certs_url,
            http_client,
            cached_keys: RwLock::new(None),
        }
    }

    async fn public_key(&self, kid: &str) -> Result<String, AppError> {
        {
            let cache = self.cached_keys.read().await;
            if let Some(cached) = cache.as_ref() {
                if cached.expires_at > Utc::now() {
                    // A fresh key set is authoritative until max-age runs out
                    return match cached.keys.get(kid) {
                        Some(key) => {
                            log::debug!("🔑 Using cached Firebase key {}", kid);
                            Ok(key.clone())
                        }
                        None => Err(AppError::Unauthenticated(format!(
                            "Unknown signing key: {}",
                            kid
                        ))),
                    };
                }
            }
        }

        self.refresh_keys().await?;

        let cache = self.cached_keys.read().await;
        cache
            .as_ref()
            .and_then(|cached| cached.keys.get(kid).cloned())
            .ok_or_else(|| AppError::Unauthenticated(format!("Unknown signing key: {}", kid)))
    }

    async fn refresh_keys(&self) -> Result<(), AppError> {
        log::info!("🔑 Fetching Firebase public keys");

        let response = self
            .http_client
            .get(&self.certs_url)
            .send()
            .await
            .map_err(|e| {
                log::warn!("⚠️  Failed to fetch Firebase public keys: {}", e);
                AppError::Unauthenticated(format!("Failed to fetch signing keys: {}", e))
            })?;

        if !response.status().is_success() {
            log::warn!("⚠️  Firebase key endpoint returned {}", response.status());
            return Err(AppError::Unauthenticated(format!(
                "Signing key endpoint returned {}",
                response.status()
            )));
        }

        let ttl = response
            .headers()
            .get("cache-control")
            .and_then(|v| v.to_str().ok())
            .and_then(parse_max_age)
            .unwrap_or(DEFAULT_CACHE_TTL_SECS)
            .max(MIN_CACHE_TTL_SECS);

        let certs: HashMap<String, String> = response.json().await.map_err(|e| {
            log::warn!("⚠️  Failed to parse Firebase public keys: {}", e);
            AppError::Unauthenticated(format!("Failed to parse signing keys: {}", e))
        })?;

        let mut keys = HashMap::with_capacity(certs.len());
        for (kid, cert_pem) in certs {
            match public_key_from_cert(&cert_pem) {
                Ok(pem) => {
                    keys.insert(kid, pem);
                }
                Err(e) => log::warn!("⚠️  Skipping certificate {}: {}", kid, e),
            }
        }

        if keys.is_empty() {
            return Err(AppError::Unauthenticated(
                "No valid Firebase signing keys".to_string(),
            ));
        }

        log::info!("✅ Cached {} Firebase public keys for {}s", keys.len(), ttl);

        let mut cache = self.cached_keys.write().await;
        *cache = Some(CachedKeys {
            keys,
            expires_at: Utc::now() + Duration::seconds(ttl),
        });

        Ok(())
    }
}

#[async_trait]
impl IdentityVerifier for FirebaseVerifier {
    async fn verify(&self, token: &str) -> Result<UserIdentity, AppError> {
        if token.trim().is_empty() {
            return Err(AppError::Unauthenticated("Empty token".to_string()));
        }

        let header = decode_header(token)
            .map_err(|e| AppError::Unauthenticated(format!("Invalid token header: {}", e)))?;

        let kid = header
            .kid
            .ok_or_else(|| AppError::Unauthenticated("Token missing key ID".to_string()))?;

        let pem = self.public_key(&kid).await?;
        let decoding_key = DecodingKey::from_rsa_pem(pem.as_bytes())
            .map_err(|e| AppError::Unauthenticated(format!("Invalid public key: {}", e)))?;

        let mut validation = Validation::new(Algorithm::RS256);
        validation.set_audience(&[&self.project_id]);
        validation.set_issuer(&[format!("{}{}", FIREBASE_ISSUER_PREFIX, self.project_id)]);
        validation.set_required_spec_claims(&["exp", "sub", "aud", "iss"]);

        let claims = decode::<FirebaseClaims>(token, &decoding_key, &validation)
            .map(|data| data.claims)
            .map_err(|e| AppError::Unauthenticated(format!("Invalid token: {}", e)))?;

        if claims.sub.is_empty() {
            return Err(AppError::Unauthenticated("Token has empty subject".to_string()));
        }

        log::debug!("✅ Firebase token valid for user: {}", claims.sub);

        Ok(UserIdentity(claims.sub))
    }
}

/// "public, max-age=19845, must-revalidate" -> 19845
fn parse_max_age(cache_control: &str) -> Option<i64> {
    cache_control
        .split(',')
        .map(str::trim)
        .find_map(|s| s.strip_prefix("max-age="))
        .and_then(|s| s.parse().ok())
}

/// Google publishes X.509 certificates; jsonwebtoken wants the SPKI as PEM
fn public_key_from_cert(cert_pem: &str) -> Result<String, String> {
    let (_, pem) = parse_x509_pem(cert_pem.as_bytes())
        .map_err(|e| format!("Failed to parse X.509 PEM: {}", e))?;

    let (_, cert) = X509Certificate::from_der(&pem.contents)
        .map_err(|e| format!("Failed to parse X.509 certificate: {}", e))?;

    let encoded = STANDARD.encode(cert.public_key().raw);
    let body = encoded
        .as_bytes()
        .chunks(64)
        .map(|c| String::from_utf8_lossy(c).into_owned())
        .collect::<Vec<_>>()
        .join("\n");

    Ok(format!(
        "-----BEGIN PUBLIC KEY-----\n{}\n-----END PUBLIC KEY-----\n",
        body
    ))
}
