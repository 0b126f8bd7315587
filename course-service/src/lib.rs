pub mod config;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod services;

use axum::middleware::{from_fn, from_fn_with_state};
use axum::{
    routing::{get, post},
    Router,
};
use mongodb::{options::ClientOptions, Client};
use secrecy::ExposeSecret;
use std::net::SocketAddr;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use config::Config;
use middleware::{auth_middleware, request_id_middleware};
use services::{
    AccessService, CourseStore, GrantService, JwtService, OrderService, RazorpayClient,
};

#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub store: CourseStore,
    pub jwt: JwtService,
    pub razorpay: RazorpayClient,
    pub orders: OrderService,
    pub grants: GrantService,
    pub access: AccessService,
}

pub struct Application {
    port: u16,
    router: Router,
}

impl Application {
    pub async fn build(config: Config) -> anyhow::Result<Self> {
        let mut client_options = ClientOptions::parse(config.database.url.expose_secret()).await?;
        client_options.app_name = Some("course-service".to_string());

        let client = Client::with_options(client_options)?;
        let db = client.database(&config.database.db_name);

        let store = CourseStore::new(&db);
        store.init_indexes().await?;

        let jwt = JwtService::new(&config.jwt);
        let razorpay = RazorpayClient::new(config.razorpay.clone())?;

        services::init_metrics();

        let state = AppState {
            store: store.clone(),
            jwt,
            razorpay: razorpay.clone(),
            orders: OrderService::new(store.clone(), razorpay.clone(), config.order.clone()),
            grants: GrantService::new(store.clone(), razorpay),
            access: AccessService::new(store),
            config: config.clone(),
        };

        // Two capability levels: public catalog reads, and owned-content /
        // payment routes behind the bearer-token middleware.
        let public = Router::new()
            .route("/health", get(handlers::health_check))
            .route("/metrics", get(handlers::metrics))
            .route("/api/auth/register", post(handlers::auth::register))
            .route("/api/auth/login", post(handlers::auth::login))
            .route("/api/courses", get(handlers::courses::list_courses))
            .route("/api/courses/:id", get(handlers::courses::get_course));

        let protected = Router::new()
            .route(
                "/api/courses/:id/content",
                get(handlers::courses::course_content),
            )
            .route(
                "/api/payment/create-order",
                post(handlers::payment::create_order),
            )
            .route(
                "/api/payment/verify",
                post(handlers::payment::verify_payment),
            )
            .route_layer(from_fn_with_state(state.clone(), auth_middleware));

        let router = public
            .merge(protected)
            .layer(from_fn(request_id_middleware))
            .layer(CorsLayer::permissive())
            .layer(
                TraceLayer::new_for_http().make_span_with(|request: &axum::http::Request<_>| {
                    let request_id = request
                        .headers()
                        .get("x-request-id")
                        .and_then(|value| value.to_str().ok())
                        .unwrap_or("-");

                    tracing::info_span!(
                        "http_request",
                        request_id = %request_id,
                        method = %request.method(),
                        uri = %request.uri(),
                        version = ?request.version(),
                    )
                }),
            )
            .with_state(state);

        Ok(Self {
            port: config.server.port,
            router,
        })
    }

    pub async fn run_until_stopped(self) -> anyhow::Result<()> {
        let addr = SocketAddr::from(([0, 0, 0, 0], self.port));
        tracing::info!("Listening on {}", addr);

        let listener = tokio::net::TcpListener::bind(addr).await?;
        axum::serve(listener, self.router).await?;

        Ok(())
    }

    pub fn port(&self) -> u16 {
        self.port
    }
}
