use std::sync::Arc;

use axum::extract::FromRef;
use tracing::warn;

use crate::auth::{jwt::TokenService, password::PasswordService};
use crate::config::AppConfig;
use crate::store::{MemoryStore, PgStore, Store};

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn Store>,
    pub tokens: TokenService,
    pub passwords: PasswordService,
}

impl FromRef<AppState> for TokenService {
    fn from_ref(state: &AppState) -> Self {
        state.tokens.clone()
    }
}

impl AppState {
    pub async fn init(config: &AppConfig) -> anyhow::Result<Self> {
        let store = match &config.database_url {
            Some(url) => Arc::new(PgStore::connect(url).await?) as Arc<dyn Store>,
            None => {
                warn!("DATABASE_URL not set; using in-memory store");
                Arc::new(MemoryStore::new()) as Arc<dyn Store>
            }
        };

        Self::from_parts(config, store)
    }

    pub fn from_parts(config: &AppConfig, store: Arc<dyn Store>) -> anyhow::Result<Self> {
        let tokens = TokenService::new(&config.jwt);
        let passwords = PasswordService::new(&config.password)?;
        Ok(Self {
            store,
            tokens,
            passwords,
        })
    }

    /// In-memory state with cheap password hashing.
    #[cfg(test)]
    pub fn fake() -> Self {
        use crate::config::{JwtConfig, PasswordConfig, ServerConfig};

        let config = AppConfig {
            database_url: None,
            jwt: JwtConfig {
                secret: "test".into(),
                ttl_minutes: 120,
            },
            password: PasswordConfig {
                m_cost_kib: 1024,
                t_cost: 1,
                p_cost: 1,
            },
            server: ServerConfig::default(),
        };
        Self::from_parts(&config, Arc::new(MemoryStore::new())).expect("fake state")
    }
}
