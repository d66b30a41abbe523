use r2d2::Pool;
use r2d2_sqlite::SqliteConnectionManager;

use crate::auth::cookies::CookieSigner;
use crate::config::Config;

pub type DbPool = Pool<SqliteConnectionManager>;

#[derive(Clone)]
pub struct AppState {
    pub db: DbPool,
    pub config: Config,
    pub signer: CookieSigner,
}

impl AppState {
    pub fn new(db: DbPool, config: Config) -> anyhow::Result<Self> {
        let signer = CookieSigner::new(config.secret_key.as_bytes())
            .map_err(|e| anyhow::anyhow!("invalid secret key: {}", e))?;
        Ok(Self { db, config, signer })
    }
}
