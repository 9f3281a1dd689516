use std::sync::Arc;

use anyhow::Result;
use tracing::info;

use super::{
    clock::{Clock, SystemClock},
    config::Config,
    database::{MemoryStore, RedisStore, SubmissionStore, init_redis},
    limiter::{QuotaPolicy, RateLimiter},
    mail::{LettreMailer, Mailer},
};

pub struct State {
    pub config: Config,
    pub limiter: RateLimiter,
    pub mailer: Arc<dyn Mailer>,
    pub clock: Arc<dyn Clock>,
}

impl State {
    pub async fn new() -> Result<Arc<Self>> {
        let config = Config::load()?;

        let store: Arc<dyn SubmissionStore> = match &config.redis_url {
            Some(redis_url) => {
                info!("Connecting to Redis...");
                Arc::new(RedisStore::new(init_redis(redis_url).await?))
            }
            None => Arc::new(MemoryStore::new()),
        };

        let mailer = Arc::new(LettreMailer::new(config.smtp.as_ref()));

        Ok(Self::with_parts(config, store, mailer, Arc::new(SystemClock)))
    }

    pub fn with_parts(
        config: Config,
        store: Arc<dyn SubmissionStore>,
        mailer: Arc<dyn Mailer>,
        clock: Arc<dyn Clock>,
    ) -> Arc<Self> {
        info!(
            store = store.backend_tag(),
            mailer = mailer.transport_tag(),
            max_submissions = config.max_submissions,
            window_secs = config.window.as_secs(),
            "Relay state ready"
        );

        let limiter = RateLimiter::new(
            store,
            QuotaPolicy {
                max_submissions: config.max_submissions,
                window: config.window,
            },
        );

        Arc::new(Self {
            config,
            limiter,
            mailer,
            clock,
        })
    }
}
