use std::{collections::HashMap, time::Duration};

use cucumber::World;
use log::*;
use pix_payment_engine::{
    db_types::{Order, OrderId},
    events::EventProducers,
    test_utils::{
        prepare_env::{prepare_test_env, random_db_path},
        StubGateway,
    },
    NotificationApi,
    OrderFlowApi,
    OrderFlowConfig,
    OrderStatusApi,
    SqliteDatabase,
};

#[derive(Default, Debug, World)]
pub struct PixWorld {
    pub system: Option<PixSystem>,
    /// Orders created during the scenario, by the alias used in the feature file.
    pub orders: HashMap<String, OrderId>,
    pub last_order: Option<Order>,
    pub last_error: Option<String>,
}

#[derive(Debug)]
pub struct PixSystem {
    pub db_path: String,
    pub db: SqliteDatabase,
    pub gateway: StubGateway,
    pub flow: OrderFlowApi<SqliteDatabase, StubGateway>,
    pub notifications: NotificationApi<SqliteDatabase, StubGateway>,
    pub status: OrderStatusApi<SqliteDatabase, StubGateway>,
}

impl PixWorld {
    pub fn system(&self) -> &PixSystem {
        self.system.as_ref().expect("The payment system has not been initialised")
    }

    pub fn order_id(&self, alias: &str) -> OrderId {
        self.orders.get(alias).cloned().unwrap_or_else(|| panic!("No order called '{alias}' has been created"))
    }
}

impl PixSystem {
    pub async fn new() -> Self {
        let db_path = random_db_path();
        let db = prepare_test_env(&db_path).await;
        debug!("Created database: {db_path}");
        let gateway = StubGateway::new();
        let config = OrderFlowConfig { gateway_timeout: Duration::from_millis(500), ..OrderFlowConfig::default() };
        let timeout = config.gateway_timeout;
        let flow = OrderFlowApi::new(db.clone(), gateway.clone(), EventProducers::default(), config);
        let notifications = NotificationApi::new(flow.reconciler().clone(), gateway.clone(), timeout);
        let status = OrderStatusApi::new(flow.reconciler().clone(), gateway.clone(), timeout);
        Self { db_path, db, gateway, flow, notifications, status }
    }
}
