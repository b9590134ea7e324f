use std::sync::Arc;

use anyhow::Context;
use axum::extract::FromRef;
use sqlx::{postgres::PgPoolOptions, PgPool};
use tracing::{info, warn};

use crate::auth::{delivery, jwt::JwtKeys, password::PasswordHasher, services::Authenticator};
use crate::config::AppConfig;
use crate::tasks::repo::{MemoryTaskStore, PgTaskStore, TaskStore};
use crate::users::directory::UserDirectory;
use crate::users::repo::{MemoryUserStore, PgUserStore, UserStore};

/// Everything a request needs; built once at startup, read-only after.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub db: Option<PgPool>,
    pub keys: JwtKeys,
    pub users: UserDirectory,
    pub auth: Authenticator,
    pub tasks: Arc<dyn TaskStore>,
}

impl FromRef<AppState> for JwtKeys {
    fn from_ref(state: &AppState) -> Self {
        state.keys.clone()
    }
}

impl AppState {
    pub async fn init() -> anyhow::Result<Self> {
        let config = Arc::new(AppConfig::from_env()?);

        let (db, users, tasks): (Option<PgPool>, Arc<dyn UserStore>, Arc<dyn TaskStore>) =
            match &config.database_url {
                Some(url) => {
                    let db = PgPoolOptions::new()
                        .max_connections(10)
                        .connect(url)
                        .await
                        .context("connect to database")?;
                    info!("using postgres storage");
                    (
                        Some(db.clone()),
                        Arc::new(PgUserStore::new(db.clone())) as Arc<dyn UserStore>,
                        Arc::new(PgTaskStore::new(db)) as Arc<dyn TaskStore>,
                    )
                }
                None => {
                    warn!("DATABASE_URL not set; using in-memory storage, data will not survive a restart");
                    (
                        None,
                        Arc::new(MemoryUserStore::new()) as Arc<dyn UserStore>,
                        Arc::new(MemoryTaskStore::new()) as Arc<dyn TaskStore>,
                    )
                }
            };

        Self::from_parts(config, db, users, tasks)
    }

    pub fn from_parts(
        config: Arc<AppConfig>,
        db: Option<PgPool>,
        users: Arc<dyn UserStore>,
        tasks: Arc<dyn TaskStore>,
    ) -> anyhow::Result<Self> {
        let keys = JwtKeys::new(&config.jwt);
        let hasher = PasswordHasher::new(&config.password)?;
        let users = UserDirectory::new(users, hasher);
        let auth = Authenticator::new(
            users.clone(),
            keys.clone(),
            delivery::from_mode(config.reset_delivery),
        );
        Ok(Self {
            config,
            db,
            keys,
            users,
            auth,
            tasks,
        })
    }

    #[cfg(test)]
    pub fn fake() -> Self {
        use crate::config::ResetDeliveryMode;

        let config = Arc::new(AppConfig {
            database_url: None,
            jwt: crate::auth::jwt::test_config("test"),
            password: crate::auth::password::cheap_config(),
            reset_delivery: ResetDeliveryMode::Inline,
        });
        Self::from_parts(
            config,
            None,
            Arc::new(MemoryUserStore::new()),
            Arc::new(MemoryTaskStore::new()),
        )
        .expect("fake state")
    }
}
