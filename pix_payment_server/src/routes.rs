//! Request handler definitions
//!
//! Define each route and it handler here.
//! Handlers that are more than a line or two MUST go into a separate module. Keep this module neat and tidy 🙏
//!
//! A note about performance:
//! Since each worker thread processes its requests sequentially, handlers which block the current thread will cause the
//! current worker to stop processing new requests. Every handler here awaits the engine, which in turn awaits the
//! database or the payment gateway, so none of them block.
use std::collections::HashMap;

use actix_web::{get, web, HttpRequest, HttpResponse, Responder};
use log::*;
use pix_payment_engine::{
    db_types::OrderId,
    order_objects::{GatewayNotification, NotificationOutcome},
    traits::{OrderStore, PaymentGateway},
    NotificationApi,
    OrderFlowApi,
    OrderStatusApi,
};

use crate::{
    data_objects::{NewOrderRequest, NewOrderResponse, OrderView, PixPaymentRequestBody, PixPaymentResponse},
    errors::ServerError,
};

// Web-actix cannot handle generics in handlers, so it's implemented manually using the `route!` macro
#[macro_export]
macro_rules! route {
    ($name:ident => $method:ident $path:literal impl $($bounds:ty),+) => {
        paste::paste! { pub struct [<$name:camel Route>]< $( [< T $bounds:camel> ],)+ >( $( core::marker::PhantomData<fn() -> [< T $bounds:camel> ] >,)+ );}
        paste::paste! { impl< $( [< T $bounds:camel> ],)+ > [<$name:camel Route>]< $( [< T $bounds:camel> ],)+ > {
            #[allow(clippy::new_without_default)]
            pub fn new() -> Self {
                Self($( core::marker::PhantomData::<fn() -> [< T $bounds:camel> ] >,)+)
            }
        }}
        paste::paste! { impl<$( [< T $bounds:camel >] , )+> actix_web::dev::HttpServiceFactory for [<$name:camel Route>]<$([<T $bounds:camel>],)+>
        where
            $([<T $bounds:camel>]: $bounds + 'static,)+
        {
            fn register(self, config: &mut actix_web::dev::AppService) {
                let res = actix_web::Resource::new($path)
                    .name(stringify!($name))
                    .guard(actix_web::guard::$method())
                    .to($name::< $( [< T $bounds:camel >], )+>);
                actix_web::dev::HttpServiceFactory::register(res, config);
            }
        }}
    };
}

// ----------------------------------------------   Health  ----------------------------------------------------
#[get("/health")]
pub async fn health() -> impl Responder {
    trace!("💻️ Received health check request");
    HttpResponse::Ok().body("👍️\n")
}

//----------------------------------------------   Orders  ----------------------------------------------------
route!(create_order => Post "/orders" impl OrderStore, PaymentGateway);
/// Route handler for creating orders
///
/// The body is `{"items": [{"id", "price", "quantity"}], "email"}`. Prices may be numbers or strings such as
/// `"R$ 10,50"`. Responds with `201 Created` and `{"orderId", "total", "status"}`.
pub async fn create_order<B, G>(
    body: web::Json<NewOrderRequest>,
    api: web::Data<OrderFlowApi<B, G>>,
) -> Result<HttpResponse, ServerError>
where
    B: OrderStore,
    G: PaymentGateway,
{
    let NewOrderRequest { items, email } = body.into_inner();
    debug!("💻️ POST new order with {} items", items.len());
    let order = api.create_order(items, email).await?;
    Ok(HttpResponse::Created().json(NewOrderResponse::from(&order)))
}

route!(order_by_id => Get "/orders/{order_id}" impl OrderStore, PaymentGateway);
/// Route handler for fetching an order
///
/// If the order is still pending and has a payment, the gateway is asked for the payment status first, so that a
/// storefront polling this endpoint sees the order flip to `PAID` even if the webhook never arrives.
pub async fn order_by_id<B, G>(
    path: web::Path<OrderId>,
    api: web::Data<OrderStatusApi<B, G>>,
) -> Result<HttpResponse, ServerError>
where
    B: OrderStore,
    G: PaymentGateway,
{
    let order_id = path.into_inner();
    debug!("💻️ GET order [{order_id}]");
    let order = api.get_order_with_freshness(&order_id).await?;
    Ok(HttpResponse::Ok().json(OrderView::from(order)))
}

//----------------------------------------------   Payments  ----------------------------------------------------
route!(create_pix_payment => Post "/payments/pix" impl OrderStore, PaymentGateway);
pub async fn create_pix_payment<B, G>(
    body: web::Json<PixPaymentRequestBody>,
    api: web::Data<OrderFlowApi<B, G>>,
) -> Result<HttpResponse, ServerError>
where
    B: OrderStore,
    G: PaymentGateway,
{
    let payer_email = body.payer_email();
    let order_id = body.into_inner().order_id;
    debug!("💻️ POST PIX payment for order [{order_id}]");
    let payment = api.request_pix_payment(&order_id, payer_email).await?;
    Ok(HttpResponse::Ok().json(PixPaymentResponse::from(payment)))
}

//----------------------------------------------   Webhooks  ----------------------------------------------------
route!(mercadopago_webhook => Post "/webhooks/mercadopago" impl OrderStore, PaymentGateway);
/// Route handler for Mercado Pago notifications
///
/// The notification is only used to learn which payment changed. The payment status always comes from the gateway.
/// This endpoint answers `200 OK` whatever happens, otherwise Mercado Pago keeps re-sending the notification.
pub async fn mercadopago_webhook<B, G>(
    req: HttpRequest,
    body: web::Bytes,
    api: web::Data<NotificationApi<B, G>>,
) -> HttpResponse
where
    B: OrderStore,
    G: PaymentGateway,
{
    let query = web::Query::<HashMap<String, String>>::from_query(req.query_string())
        .map(|q| q.into_inner())
        .unwrap_or_else(|e| {
            debug!("💻️ Ignoring unreadable webhook query string. {e}");
            HashMap::new()
        });
    let notification = GatewayNotification::from_parts(&body, &query);
    match api.handle_notification(notification).await {
        NotificationOutcome::Ignored(reason) => trace!("💻️ Webhook ignored. {reason}"),
        NotificationOutcome::Reconciled(result) => trace!("💻️ Webhook reconciled. {}", result.current_status),
        NotificationOutcome::Failed(reason) => debug!("💻️ Webhook could not be processed. {reason}"),
    }
    HttpResponse::Ok().finish()
}

//----------------------------------------------   Testing  ----------------------------------------------------
#[cfg(any(test, feature = "test_endpoints"))]
pub use test_routes::{approve_order, ApproveOrderRoute};

#[cfg(any(test, feature = "test_endpoints"))]
mod test_routes {
    use actix_web::{web, HttpResponse};
    use log::*;
    use pix_payment_engine::{traits::OrderStore, Reconciler};

    use crate::{
        data_objects::{ApproveRequest, JsonResponse},
        errors::ServerError,
    };

    route!(approve_order => Post "/test/approve" impl OrderStore);
    /// Marks an order as paid without asking the gateway. For sandbox testing only.
    pub async fn approve_order<B: OrderStore>(
        body: web::Json<ApproveRequest>,
        api: web::Data<Reconciler<B>>,
    ) -> Result<HttpResponse, ServerError> {
        let order_id = body.into_inner().order_id;
        warn!("💻️ Forcing approval for order [{order_id}]");
        let result = api.force_approve(&order_id).await?;
        let message = if result.applied {
            "Order manually approved for testing".to_string()
        } else {
            format!("Order is already {}", result.current_status)
        };
        Ok(HttpResponse::Ok().json(JsonResponse { status: result.current_status, message }))
    }
}
