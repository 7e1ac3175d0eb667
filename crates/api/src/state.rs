use std::sync::Arc;

use infra::repos::{CheckInLogRepo, MemberRepo};
use sqlx::PgPool;

use crate::auth::{AuthConfig, JwtService, PasswordService};
use crate::checkin::CheckInRecorder;
use crate::clock::{Clock, SystemClock};
use crate::config::AppConfig;
use crate::services::{BroadcastNotifier, ExpirationSweeper, Notifier};

#[derive(Clone)]
pub struct AppState {
    pub db: PgPool,
    config: Arc<AppConfig>,
    jwt_service: JwtService,
    password_service: PasswordService,
    broadcaster: BroadcastNotifier,
    clock: Arc<dyn Clock>,
}

impl AppState {
    pub fn new(db: PgPool, config: AppConfig) -> anyhow::Result<Self> {
        let auth_config = AuthConfig::from_env()?;
        let jwt_service = JwtService::new(&auth_config);
        let password_service = PasswordService::new(auth_config.hash_rounds);

        Ok(Self {
            db,
            config: Arc::new(config),
            jwt_service,
            password_service,
            broadcaster: BroadcastNotifier::new(),
            clock: Arc::new(SystemClock),
        })
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    pub fn jwt_service(&self) -> &JwtService {
        &self.jwt_service
    }

    pub fn password_service(&self) -> PasswordService {
        self.password_service
    }

    /// Channel the WebSocket listeners subscribe to.
    pub fn broadcaster(&self) -> &BroadcastNotifier {
        &self.broadcaster
    }

    pub fn notifier(&self) -> Arc<dyn Notifier> {
        Arc::new(self.broadcaster.clone())
    }

    pub fn clock(&self) -> Arc<dyn Clock> {
        self.clock.clone()
    }

    pub fn check_ins(&self) -> CheckInRecorder {
        CheckInRecorder::new(
            Arc::new(MemberRepo::new(self.db.clone())),
            Arc::new(CheckInLogRepo::new(self.db.clone())),
            self.clock(),
        )
    }

    pub fn expiration_sweeper(&self) -> ExpirationSweeper {
        ExpirationSweeper::new(Arc::new(MemberRepo::new(self.db.clone())), self.clock())
    }
}
