use std::{future::Future, pin::Pin, time::Duration};

use actix_cors::Cors;
use actix_web::{
    dev::Server,
    http::KeepAlive,
    middleware::Logger,
    web,
    web::ServiceConfig,
    App,
    HttpServer,
    Scope,
};
use log::*;
use pix_payment_engine::{
    events::{EventHandlers, EventHooks, EventProducers},
    traits::{OrderStore, PaymentGateway},
    NotificationApi,
    OrderFlowApi,
    OrderFlowConfig,
    OrderStatusApi,
    SqliteDatabase,
};

use crate::{
    config::ServerConfig,
    errors::ServerError,
    expiry_worker::start_expiry_worker,
    integrations::mercadopago::MercadoPagoGateway,
    routes::{health, CreateOrderRoute, CreatePixPaymentRoute, MercadopagoWebhookRoute, OrderByIdRoute},
};

const EVENT_BUFFER_SIZE: usize = 25;

pub async fn run_server(config: ServerConfig) -> Result<(), ServerError> {
    let db = SqliteDatabase::new_with_url(&config.database_url, 25)
        .await
        .map_err(|e| ServerError::InitializeError(e.to_string()))?;
    db.run_migrations().await.map_err(|e| ServerError::InitializeError(e.to_string()))?;
    let gateway = MercadoPagoGateway::new(config.mercadopago.clone())?;
    let handlers = EventHandlers::new(EVENT_BUFFER_SIZE, create_event_hooks());
    let producers = handlers.producers();
    handlers.start_handlers().await;
    let expiry_api = OrderFlowApi::new(db.clone(), gateway.clone(), producers.clone(), config.order_flow.clone());
    let _worker = start_expiry_worker(expiry_api, config.unpaid_order_timeout, config.expiry_check_interval);
    let srv = create_server_instance(config, db, gateway, producers)?;
    srv.await.map_err(|e| ServerError::Unspecified(e.to_string()))
}

pub fn create_server_instance<B, G>(
    config: ServerConfig,
    db: B,
    gateway: G,
    producers: EventProducers,
) -> Result<Server, ServerError>
where
    B: OrderStore + Clone + Send + 'static,
    G: PaymentGateway + Clone + Send + 'static,
{
    #[cfg(feature = "test_endpoints")]
    warn!("🚨️ The test approval endpoint is enabled. Anyone can mark any order as paid. 🚨️");
    let cors_origin = config.cors_allowed_origin.clone();
    let order_flow = config.order_flow.clone();
    let srv = HttpServer::new(move || {
        let cors = match &cors_origin {
            Some(origin) => Cors::default().allowed_origin(origin).allow_any_method().allow_any_header().max_age(3600),
            None => Cors::permissive(),
        };
        App::new()
            .wrap(Logger::new("%t (%D ms) %s %a %{Host}i %U").log_target("pgw::access_log"))
            .wrap(cors)
            .configure(configure_app(db.clone(), gateway.clone(), producers.clone(), order_flow.clone()))
    })
    .keep_alive(KeepAlive::Timeout(Duration::from_secs(600)))
    .bind((config.host.as_str(), config.port))?
    .run();
    Ok(srv)
}

/// Registers the engine APIs and every route on an app.
pub fn configure_app<B, G>(
    db: B,
    gateway: G,
    producers: EventProducers,
    config: OrderFlowConfig,
) -> impl FnOnce(&mut ServiceConfig)
where
    B: OrderStore + Clone + 'static,
    G: PaymentGateway + Clone + 'static,
{
    move |cfg: &mut ServiceConfig| {
        let timeout = config.gateway_timeout;
        let orders_api = OrderFlowApi::new(db, gateway.clone(), producers, config);
        let reconciler = orders_api.reconciler().clone();
        let status_api = OrderStatusApi::new(reconciler.clone(), gateway.clone(), timeout);
        let notification_api = NotificationApi::new(reconciler.clone(), gateway, timeout);
        cfg.app_data(json_config())
            .app_data(web::Data::new(orders_api))
            .app_data(web::Data::new(status_api))
            .app_data(web::Data::new(notification_api))
            .app_data(web::Data::new(reconciler))
            .service(health)
            .service(api_scope::<B, G>());
    }
}

pub fn api_scope<B, G>() -> Scope
where
    B: OrderStore + 'static,
    G: PaymentGateway + 'static,
{
    let scope = web::scope("/api")
        .service(CreateOrderRoute::<B, G>::new())
        .service(OrderByIdRoute::<B, G>::new())
        .service(CreatePixPaymentRoute::<B, G>::new())
        .service(MercadopagoWebhookRoute::<B, G>::new());
    #[cfg(any(test, feature = "test_endpoints"))]
    let scope = scope.service(crate::routes::ApproveOrderRoute::<B>::new());
    scope
}

/// Malformed JSON bodies get the same `{"error": ...}` payload as every other failure.
pub fn json_config() -> web::JsonConfig {
    web::JsonConfig::default()
        .error_handler(|err, _req| ServerError::InvalidRequestBody(err.to_string()).into())
}

fn create_event_hooks() -> EventHooks {
    let mut hooks = EventHooks::default();
    hooks.on_order_paid(|ev| {
        Box::pin(async move {
            info!("📬️ Order [{}] paid. Total: {}", ev.order.id, ev.order.total);
        }) as Pin<Box<dyn Future<Output = ()> + Send>>
    });
    hooks.on_order_annulled(|ev| {
        Box::pin(async move {
            info!("📬️ Order [{}] annulled. Status: {}", ev.order.id, ev.status);
        }) as Pin<Box<dyn Future<Output = ()> + Send>>
    });
    hooks
}
