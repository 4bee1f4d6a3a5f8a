use std::sync::Arc;
use std::time::Duration;

use r2d2::Pool;
use r2d2_sqlite::SqliteConnectionManager;

use crate::auth::identity::{HttpIdentityProvider, IdentityProvider};
use crate::auth::tokens::TokenIssuer;
use crate::config::Config;
use crate::moderation::{ChatCompletionsClassifier, Moderator};
use crate::notifications::{ExpoPushClient, PushSender};

pub type DbPool = Pool<SqliteConnectionManager>;

/// Everything a request handler may touch. Built once in `main`.
#[derive(Clone)]
pub struct AppState {
    pub db: DbPool,
    pub config: Config,
    pub tokens: Arc<TokenIssuer>,
    pub moderator: Moderator,
    pub push: Arc<dyn PushSender>,
    pub identity: Arc<dyn IdentityProvider>,
}

impl AppState {
    /// Wire the production collaborators from config.
    pub fn from_config(db: DbPool, config: Config) -> anyhow::Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.http.timeout_secs))
            .build()?;

        let tokens = TokenIssuer::from_config(&config.auth)?;
        let moderator = Moderator::new(Arc::new(ChatCompletionsClassifier::new(
            http.clone(),
            &config.moderation,
        )));
        let push = Arc::new(ExpoPushClient::new(http.clone(), &config.push));
        let identity = Arc::new(HttpIdentityProvider::new(http, &config.identity));

        Ok(Self {
            db,
            config,
            tokens: Arc::new(tokens),
            moderator,
            push,
            identity,
        })
    }
}
