use std::env;
use std::net::SocketAddr;
use tracing::warn;

const DEFAULT_TOKEN_TTL_HOURS: i64 = 24;
/// One year.
const MAX_TOKEN_TTL_HOURS: i64 = 8760;

/// Which repository implementation backs the API.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageBackend {
    Memory,
    Supabase,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub supabase_url: String,
    pub supabase_anon_key: String,
    pub jwt_secret: String,
    pub token_ttl_hours: i64,
    pub storage: StorageBackend,
    pub bind_addr: SocketAddr,
}

impl AppConfig {
    pub fn from_env() -> Self {
        let supabase_url = env::var("SUPABASE_URL")
            .unwrap_or_else(|_| {
                warn!("SUPABASE_URL not set, using empty value");
                String::new()
            });
        let supabase_anon_key = env::var("SUPABASE_ANON_PUBLIC_KEY")
            .unwrap_or_else(|_| {
                warn!("SUPABASE_ANON_PUBLIC_KEY not set, using empty value");
                String::new()
            });
        let jwt_secret = env::var("CLINIC_JWT_SECRET")
            .unwrap_or_else(|_| {
                warn!("CLINIC_JWT_SECRET not set, login will be unavailable");
                String::new()
            });

        let token_ttl_hours = match env::var("CLINIC_TOKEN_TTL_HOURS") {
            Ok(raw) => parse_token_ttl(&raw),
            Err(_) => DEFAULT_TOKEN_TTL_HOURS,
        };

        let bind_addr = env::var("CLINIC_BIND_ADDR")
            .ok()
            .and_then(|raw| match raw.parse() {
                Ok(addr) => Some(addr),
                Err(_) => {
                    warn!("CLINIC_BIND_ADDR is not a socket address ({}), using default", raw);
                    None
                }
            })
            .unwrap_or_else(default_bind_addr);

        let supabase_ready = !supabase_url.is_empty() && !supabase_anon_key.is_empty();
        let storage = match env::var("CLINIC_STORAGE").as_deref() {
            Ok("memory") => StorageBackend::Memory,
            Ok("supabase") => StorageBackend::Supabase,
            Ok(other) => {
                warn!("Unknown CLINIC_STORAGE value '{}', choosing from Supabase settings", other);
                if supabase_ready { StorageBackend::Supabase } else { StorageBackend::Memory }
            }
            Err(_) if supabase_ready => StorageBackend::Supabase,
            Err(_) => {
                warn!("Supabase not configured, falling back to in-memory storage");
                StorageBackend::Memory
            }
        };

        let config = Self {
            supabase_url,
            supabase_anon_key,
            jwt_secret,
            token_ttl_hours,
            storage,
            bind_addr,
        };

        if !config.is_configured() {
            warn!("Application not fully configured - missing environment variables");
        }

        config
    }

    pub fn is_configured(&self) -> bool {
        let storage_ready = match self.storage {
            StorageBackend::Memory => true,
            StorageBackend::Supabase => self.is_supabase_configured(),
        };
        storage_ready && !self.jwt_secret.is_empty()
    }

    pub fn is_supabase_configured(&self) -> bool {
        !self.supabase_url.is_empty() && !self.supabase_anon_key.is_empty()
    }
}

/// Token lifetime in hours, between 1 and [`MAX_TOKEN_TTL_HOURS`].
fn parse_token_ttl(raw: &str) -> i64 {
    match raw.trim().parse::<i64>() {
        Ok(hours) if (1..=MAX_TOKEN_TTL_HOURS).contains(&hours) => hours,
        Ok(hours) => {
            warn!(
                "CLINIC_TOKEN_TTL_HOURS must be between 1 and {} ({}), using default",
                MAX_TOKEN_TTL_HOURS, hours
            );
            DEFAULT_TOKEN_TTL_HOURS
        }
        Err(_) => {
            warn!("CLINIC_TOKEN_TTL_HOURS is not a number ({}), using default", raw);
            DEFAULT_TOKEN_TTL_HOURS
        }
    }
}

fn default_bind_addr() -> SocketAddr {
    SocketAddr::from(([0, 0, 0, 0], 3000))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn memory_storage_only_needs_a_secret() {
        let config = AppConfig {
            supabase_url: String::new(),
            supabase_anon_key: String::new(),
            jwt_secret: "secret".to_string(),
            token_ttl_hours: DEFAULT_TOKEN_TTL_HOURS,
            storage: StorageBackend::Memory,
            bind_addr: default_bind_addr(),
        };
        assert!(config.is_configured());
        assert!(!config.is_supabase_configured());
    }

    #[test]
    fn token_ttl_outside_range_falls_back_to_default() {
        assert_eq!(parse_token_ttl("48"), 48);
        assert_eq!(parse_token_ttl(" 8760 "), MAX_TOKEN_TTL_HOURS);
        assert_eq!(parse_token_ttl("0"), DEFAULT_TOKEN_TTL_HOURS);
        assert_eq!(parse_token_ttl("-5"), DEFAULT_TOKEN_TTL_HOURS);
        assert_eq!(parse_token_ttl("9223372036854775"), DEFAULT_TOKEN_TTL_HOURS);
        assert_eq!(parse_token_ttl("soon"), DEFAULT_TOKEN_TTL_HOURS);
    }

    #[test]
    fn default_bind_addr_listens_on_port_3000() {
        assert_eq!(default_bind_addr().port(), 3000);
    }
}
