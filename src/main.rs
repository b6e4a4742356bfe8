use std::sync::Arc;
use std::time::Duration;

use axum::http::{header, HeaderValue, Method};
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use checkout_core::adapters::email::ResendEmailSender;
use checkout_core::adapters::gateways::{PaypalConfig, PaypalGateway, RazorpayConfig, RazorpayGateway};
use checkout_core::adapters::http::{router, CheckoutAppState, RedirectUrls};
use checkout_core::adapters::memory::InMemoryPlanCatalog;
use checkout_core::adapters::postgres::{PostgresCartRepository, PostgresCouponRepository};
use checkout_core::application::handlers::checkout::CompletionEffects;
use checkout_core::config::{AppConfig, ServerConfig};
use checkout_core::domain::signup::SignupTokenService;
use checkout_core::ports::{CartRepository, CouponRepository, GatewayRegistry};

type BoxError = Box<dyn std::error::Error + Send + Sync>;

fn init_tracing(config: &ServerConfig, json: bool) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config.log_level.clone()));

    let registry = tracing_subscriber::registry().with(filter);
    let result = if json {
        registry.with(tracing_subscriber::fmt::layer().json()).try_init()
    } else {
        registry.with(tracing_subscriber::fmt::layer()).try_init()
    };
    if let Err(e) = result {
        eprintln!("tracing already initialized: {}", e);
    }
}

fn cors_layer(config: &ServerConfig) -> CorsLayer {
    let origins: Vec<HeaderValue> = config
        .cors_origins_list()
        .iter()
        .filter(|o| !o.is_empty())
        .filter_map(|o| HeaderValue::from_str(o).ok())
        .collect();

    let layer = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::PATCH])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION]);

    if origins.is_empty() {
        layer.allow_origin(Any)
    } else {
        layer.allow_origin(AllowOrigin::list(origins))
    }
}

#[tokio::main]
async fn main() -> Result<(), BoxError> {
    let config = AppConfig::load()?;
    init_tracing(&config.server, config.is_production());
    config.validate()?;

    let pool = config.database.pool_options().connect(&config.database.url).await?;
    if config.database.run_migrations {
        sqlx::migrate!("./migrations").run(&pool).await?;
        tracing::info!("Migrations applied");
    }

    let carts: Arc<dyn CartRepository> = Arc::new(PostgresCartRepository::new(pool.clone()));
    let coupons: Arc<dyn CouponRepository> = Arc::new(PostgresCouponRepository::new(pool));

    let razorpay = &config.payment.razorpay;
    let paypal = &config.payment.paypal;
    let gateways = GatewayRegistry::new(
        Arc::new(RazorpayGateway::new(
            RazorpayConfig::new(
                razorpay.key_id.clone(),
                razorpay.key_secret(),
                razorpay.webhook_secret(),
            )
            .with_base_url(razorpay.api_base.clone()),
        )),
        Arc::new(PaypalGateway::new(
            PaypalConfig::new(
                paypal.client_id.clone(),
                paypal.client_secret(),
                paypal.webhook_id.clone(),
            )
            .with_base_url(paypal.api_base.clone())
            .with_redirects(config.server.paypal_return_url(), config.server.checkout_url()),
        )),
    );

    let tokens = Arc::new(
        SignupTokenService::new(config.signup.token_secret())
            .with_ttl_hours(config.signup.token_ttl_hours),
    );
    let email = Arc::new(
        ResendEmailSender::new(config.email.api_key(), config.email.from_header())
            .with_api_url(config.email.api_url.clone())
            .with_reply_to(config.email.reply_to.clone()),
    );
    let effects = CompletionEffects::new(tokens.clone(), coupons.clone(), email)
        .with_signup_url(config.signup.signup_url.clone());

    let state = CheckoutAppState {
        carts,
        coupons,
        catalog: Arc::new(InMemoryPlanCatalog::with_default_plans()),
        gateways,
        tokens,
        effects,
        partner_key: Arc::new(config.partner.api_key()),
        redirects: RedirectUrls {
            success: config.server.checkout_success_url(),
            checkout: config.server.checkout_url(),
        },
        razorpay_key_id: razorpay.key_id.clone(),
    };

    let app = router(state)
        .layer(TimeoutLayer::new(Duration::from_secs(
            config.server.request_timeout_secs,
        )))
        .layer(cors_layer(&config.server))
        .layer(TraceLayer::new_for_http());

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!(
        addr = %listener.local_addr()?,
        environment = ?config.server.environment,
        "Checkout service listening"
    );

    axum::serve(listener, app).await?;
    Ok(())
}
