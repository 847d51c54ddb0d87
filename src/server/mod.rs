//! Server initialization and routing

use crate::api;
use crate::config::Config;
use crate::crypto::Argon2PasswordHasher;
use crate::email::{EmailProvider, SmtpEmailProvider};
use crate::jwt::JwtManager;
use crate::push::{HttpPushProvider, PushProvider};
use crate::repository::{
    billing::BillingRepositoryImpl, employee::EmployeeRepositoryImpl,
    guest_report::GuestReportRepositoryImpl, home::HomeRepositoryImpl,
    job::JobAssignmentRepositoryImpl, relationship::ClientRelationshipRepositoryImpl,
    schedule::ScheduleRepositoryImpl, user::UserRepositoryImpl,
};
use crate::service::{AuthService, GuestNotLeftService, InvitationService, NotificationService};
use crate::state::{HasAuth, HasDbPool, HasGuestNotLeft, HasInvitations};
use anyhow::Result;
use axum::{
    routing::{delete, get, post},
    Router,
};
use sqlx::{mysql::MySqlPoolOptions, MySqlPool};
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing::{info, warn};

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub db_pool: MySqlPool,
    pub jwt_manager: JwtManager,
    pub auth_service: Arc<AuthService<UserRepositoryImpl>>,
    pub invitation_service: Arc<
        InvitationService<
            ClientRelationshipRepositoryImpl,
            UserRepositoryImpl,
            HomeRepositoryImpl,
            BillingRepositoryImpl,
            ScheduleRepositoryImpl,
        >,
    >,
    pub guest_not_left_service: Arc<
        GuestNotLeftService<
            JobAssignmentRepositoryImpl,
            GuestReportRepositoryImpl,
            EmployeeRepositoryImpl,
            HomeRepositoryImpl,
            UserRepositoryImpl,
        >,
    >,
    pub notification_service: Arc<NotificationService>,
    pub user_repo: Arc<UserRepositoryImpl>,
}

impl HasAuth for AppState {
    type AuthUserRepo = UserRepositoryImpl;

    fn auth_service(&self) -> &AuthService<Self::AuthUserRepo> {
        &self.auth_service
    }

    fn jwt_manager(&self) -> &JwtManager {
        &self.jwt_manager
    }
}

impl HasInvitations for AppState {
    type RelationshipRepo = ClientRelationshipRepositoryImpl;
    type UserRepo = UserRepositoryImpl;
    type HomeRepo = HomeRepositoryImpl;
    type BillingRepo = BillingRepositoryImpl;
    type ScheduleRepo = ScheduleRepositoryImpl;

    fn invitation_service(
        &self,
    ) -> &InvitationService<
        Self::RelationshipRepo,
        Self::UserRepo,
        Self::HomeRepo,
        Self::BillingRepo,
        Self::ScheduleRepo,
    > {
        &self.invitation_service
    }

    fn notification_service(&self) -> &NotificationService {
        &self.notification_service
    }

    fn user_repo(&self) -> &Self::UserRepo {
        &self.user_repo
    }
}

impl HasGuestNotLeft for AppState {
    type AssignmentRepo = JobAssignmentRepositoryImpl;
    type GuestReportRepo = GuestReportRepositoryImpl;
    type EmployeeRepo = EmployeeRepositoryImpl;
    type GnlHomeRepo = HomeRepositoryImpl;
    type GnlUserRepo = UserRepositoryImpl;

    fn guest_not_left_service(
        &self,
    ) -> &GuestNotLeftService<
        Self::AssignmentRepo,
        Self::GuestReportRepo,
        Self::EmployeeRepo,
        Self::GnlHomeRepo,
        Self::GnlUserRepo,
    > {
        &self.guest_not_left_service
    }
}

impl HasDbPool for AppState {
    fn db_pool(&self) -> &MySqlPool {
        &self.db_pool
    }
}

/// Build the application state from configuration
pub async fn build_state(config: Config) -> Result<AppState> {
    let db_pool = MySqlPoolOptions::new()
        .max_connections(config.database.max_connections)
        .min_connections(config.database.min_connections)
        .connect(&config.database.url)
        .await?;

    info!("Connected to database");

    sqlx::migrate!("./migrations").run(&db_pool).await?;
    info!("Migrations applied");

    // Repositories
    let relationship_repo = Arc::new(ClientRelationshipRepositoryImpl::new(db_pool.clone()));
    let user_repo = Arc::new(UserRepositoryImpl::new(db_pool.clone()));
    let home_repo = Arc::new(HomeRepositoryImpl::new(db_pool.clone()));
    let billing_repo = Arc::new(BillingRepositoryImpl::new(db_pool.clone()));
    let schedule_repo = Arc::new(ScheduleRepositoryImpl::new(db_pool.clone()));
    let assignment_repo = Arc::new(JobAssignmentRepositoryImpl::new(db_pool.clone()));
    let guest_report_repo = Arc::new(GuestReportRepositoryImpl::new(db_pool.clone()));
    let employee_repo = Arc::new(EmployeeRepositoryImpl::new(db_pool.clone()));

    let jwt_manager = JwtManager::new(config.jwt.clone());
    let hasher = Arc::new(Argon2PasswordHasher);

    // Notification providers are optional; missing config disables a channel
    let email_provider: Option<Arc<dyn EmailProvider>> = match &config.smtp {
        Some(smtp) => match SmtpEmailProvider::from_config(smtp) {
            Ok(provider) => Some(Arc::new(provider)),
            Err(e) => {
                warn!("Email disabled: {}", e);
                None
            }
        },
        None => {
            info!("SMTP_HOST not set, email delivery disabled");
            None
        }
    };
    let push_provider: Option<Arc<dyn PushProvider>> = match &config.push {
        Some(push) => Some(Arc::new(HttpPushProvider::new(push.clone()))),
        None => {
            info!("PUSH_GATEWAY_URL not set, push delivery disabled");
            None
        }
    };

    let notification_service = Arc::new(NotificationService::new(
        email_provider,
        push_provider,
        config.app_base_url.clone(),
    ));

    let auth_service = Arc::new(AuthService::new(
        user_repo.clone(),
        hasher.clone(),
        jwt_manager.clone(),
    ));

    let invitation_service = Arc::new(InvitationService::new(
        relationship_repo,
        user_repo.clone(),
        home_repo.clone(),
        billing_repo,
        schedule_repo,
        hasher,
    ));

    let guest_not_left_service = Arc::new(GuestNotLeftService::new(
        assignment_repo,
        guest_report_repo,
        employee_repo,
        home_repo,
        user_repo.clone(),
        notification_service.clone(),
    ));

    Ok(AppState {
        config: Arc::new(config),
        db_pool,
        jwt_manager,
        auth_service,
        invitation_service,
        guest_not_left_service,
        notification_service,
        user_repo,
    })
}

/// Build the HTTP router
pub fn build_router<S>(state: S) -> Router
where
    S: HasInvitations + HasGuestNotLeft + HasDbPool,
{
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        // Health endpoints
        .route("/health", get(api::health::health))
        .route("/ready", get(api::health::ready::<S>))
        // Auth endpoints
        .route("/api/v1/auth/login", post(api::auth::login::<S>))
        .route("/api/v1/auth/accounts", get(api::auth::accounts::<S>))
        // Cleaner-clients endpoints
        .route(
            "/api/v1/cleaner-clients",
            get(api::cleaner_clients::list::<S>),
        )
        .route(
            "/api/v1/cleaner-clients/invitations",
            post(api::cleaner_clients::create::<S>),
        )
        .route(
            "/api/v1/cleaner-clients/invitations/{token}",
            get(api::cleaner_clients::validate_token::<S>),
        )
        .route(
            "/api/v1/cleaner-clients/invitations/accept",
            post(api::cleaner_clients::accept::<S>),
        )
        .route(
            "/api/v1/cleaner-clients/invitations/{token}/decline",
            post(api::cleaner_clients::decline::<S>),
        )
        .route(
            "/api/v1/cleaner-clients/{id}/resend",
            post(api::cleaner_clients::resend::<S>),
        )
        .route(
            "/api/v1/cleaner-clients/{id}",
            delete(api::cleaner_clients::remove::<S>),
        )
        // Guest-not-left endpoints
        .route(
            "/api/v1/guest-not-left/assignments/{id}/report",
            post(api::guest_not_left::report::<S>),
        )
        .route(
            "/api/v1/guest-not-left/assignments/{id}/clear",
            post(api::guest_not_left::clear::<S>),
        )
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

/// Spawn the periodic guest-not-left expiry sweep
fn spawn_guest_not_left_sweeper(state: AppState) {
    let interval_secs = state.config.guest_not_left.sweep_interval_secs;

    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(Duration::from_secs(interval_secs));
        // The immediate first tick would race startup; skip it
        ticker.tick().await;

        loop {
            ticker.tick().await;
            match state.guest_not_left_service.sweep_expired().await {
                Ok(0) => {}
                Ok(swept) => info!("Guest-not-left sweep resolved {} assignments", swept),
                Err(e) => warn!("Guest-not-left sweep failed: {}", e),
            }
        }
    });
}

/// Run the server
pub async fn run(config: Config) -> Result<()> {
    let http_addr = config.http_addr();
    let state = build_state(config).await?;

    spawn_guest_not_left_sweeper(state.clone());

    let app = build_router(state);

    let listener = TcpListener::bind(&http_addr).await?;
    info!("HTTP server listening on {}", http_addr);
    axum::serve(listener, app).await?;

    Ok(())
}
