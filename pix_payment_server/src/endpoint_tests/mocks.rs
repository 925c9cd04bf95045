use std::sync::Arc;

use mockall::mock;
use pix_payment_engine::{
    db_types::PaymentHandle,
    traits::{GatewayError, PaymentGateway, PaymentStatusReport, PixPayment, PixPaymentRequest},
};

mock! {
    pub Gateway {}
    impl PaymentGateway for Gateway {
        async fn create_pix_payment(&self, request: PixPaymentRequest) -> Result<PixPayment, GatewayError>;
        async fn payment_status(&self, payment_id: &PaymentHandle) -> Result<PaymentStatusReport, GatewayError>;
    }
}

/// The app needs a `Clone` gateway; mocks are not.
#[derive(Clone)]
pub struct SharedMock(pub Arc<MockGateway>);

impl SharedMock {
    pub fn new(mock: MockGateway) -> Self {
        Self(Arc::new(mock))
    }
}

impl PaymentGateway for SharedMock {
    async fn create_pix_payment(&self, request: PixPaymentRequest) -> Result<PixPayment, GatewayError> {
        self.0.create_pix_payment(request).await
    }

    async fn payment_status(&self, payment_id: &PaymentHandle) -> Result<PaymentStatusReport, GatewayError> {
        self.0.payment_status(payment_id).await
    }
}
