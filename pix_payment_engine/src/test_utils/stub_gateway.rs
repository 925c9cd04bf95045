use std::{
    collections::HashMap,
    sync::{Arc, Mutex, MutexGuard},
    time::Duration,
};

use crate::{
    db_types::{PaymentHandle, PaymentStatus},
    traits::{GatewayError, PaymentGateway, PaymentStatusReport, PixPayment, PixPaymentRequest},
};

#[derive(Debug, Default)]
struct StubState {
    next_id: u64,
    payments: HashMap<PaymentHandle, PaymentStatusReport>,
    requests: Vec<PixPaymentRequest>,
    create_error: Option<GatewayError>,
    status_error: Option<GatewayError>,
    delay: Option<Duration>,
    create_calls: usize,
    status_calls: usize,
}

/// A scriptable in-process payment gateway.
///
/// Created payments start out `pending` and carry the request's amount and external reference. Tests move them along
/// with [`StubGateway::set_status`] or [`StubGateway::approve`], inject failures, or slow every call down to provoke
/// timeouts. Clones share state.
#[derive(Debug, Clone, Default)]
pub struct StubGateway {
    state: Arc<Mutex<StubState>>,
}

impl StubGateway {
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> MutexGuard<'_, StubState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn approve(&self, handle: &PaymentHandle) {
        self.set_status(handle, PaymentStatus::Approved);
    }

    pub fn set_status(&self, handle: &PaymentHandle, status: PaymentStatus) {
        let mut state = self.state();
        let report =
            state.payments.entry(handle.clone()).or_insert_with(|| PaymentStatusReport::new(handle.clone(), status.clone()));
        report.status = status;
    }

    /// Replaces the whole report the gateway returns for `report.payment_id`.
    pub fn set_report(&self, report: PaymentStatusReport) {
        self.state().payments.insert(report.payment_id.clone(), report);
    }

    pub fn fail_creates_with(&self, error: Option<GatewayError>) {
        self.state().create_error = error;
    }

    pub fn fail_status_with(&self, error: Option<GatewayError>) {
        self.state().status_error = error;
    }

    pub fn set_delay(&self, delay: Option<Duration>) {
        self.state().delay = delay;
    }

    pub fn create_calls(&self) -> usize {
        self.state().create_calls
    }

    pub fn status_calls(&self) -> usize {
        self.state().status_calls
    }

    pub fn requests(&self) -> Vec<PixPaymentRequest> {
        self.state().requests.clone()
    }

    async fn pause(&self) {
        let delay = self.state().delay;
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
    }
}

impl PaymentGateway for StubGateway {
    async fn create_pix_payment(&self, request: PixPaymentRequest) -> Result<PixPayment, GatewayError> {
        self.state().create_calls += 1;
        self.pause().await;
        let mut state = self.state();
        if let Some(e) = state.create_error.clone() {
            return Err(e);
        }
        state.next_id += 1;
        let payment_id = PaymentHandle::from(format!("{}", 1_000_000 + state.next_id));
        let report = PaymentStatusReport::new(payment_id.clone(), PaymentStatus::Pending)
            .with_external_reference(request.external_reference.clone())
            .with_amount(request.amount);
        state.payments.insert(payment_id.clone(), report);
        let qr_payload = format!("00020126580014br.gov.bcb.pix0136{}5204000053039865802BR", request.external_reference);
        state.requests.push(request);
        Ok(PixPayment { payment_id, status: PaymentStatus::Pending, qr_payload, qr_image_base64: Some("AQID".into()) })
    }

    async fn payment_status(&self, payment_id: &PaymentHandle) -> Result<PaymentStatusReport, GatewayError> {
        self.state().status_calls += 1;
        self.pause().await;
        let state = self.state();
        if let Some(e) = state.status_error.clone() {
            return Err(e);
        }
        state
            .payments
            .get(payment_id)
            .cloned()
            .ok_or_else(|| GatewayError::Rejected { status: 404, message: format!("Payment {payment_id} not found") })
    }
}
