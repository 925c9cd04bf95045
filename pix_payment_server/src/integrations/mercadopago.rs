//! [`PaymentGateway`] backed by the Mercado Pago REST API.
use std::time::Duration;

use log::*;
use mercadopago_tools::{MercadoPagoApi, MercadoPagoApiError, MercadoPagoConfig, MpPayment, NewPixPayment};
use pgw_common::Cents;
use pix_payment_engine::{
    db_types::{OrderId, PaymentHandle, PaymentStatus},
    traits::{GatewayError, PaymentGateway, PaymentStatusReport, PixPayment, PixPaymentRequest},
};

use crate::errors::ServerError;

#[derive(Clone)]
pub struct MercadoPagoGateway {
    api: MercadoPagoApi,
    timeout: Duration,
}

impl MercadoPagoGateway {
    pub fn new(config: MercadoPagoConfig) -> Result<Self, ServerError> {
        if config.access_token.is_empty() {
            warn!("🪛️ No Mercado Pago access token is configured. Payment requests will fail.");
        }
        let timeout = config.timeout;
        let api = MercadoPagoApi::new(config).map_err(|e| ServerError::InitializeError(e.to_string()))?;
        Ok(Self { api, timeout })
    }

    fn convert_error(&self, e: MercadoPagoApiError) -> GatewayError {
        match e {
            MercadoPagoApiError::QueryError { status, message } => GatewayError::Rejected { status, message },
            MercadoPagoApiError::InvalidPaymentId(id) => {
                GatewayError::Rejected { status: 400, message: format!("Invalid payment id {id:?}") }
            },
            MercadoPagoApiError::Timeout(_) => GatewayError::Timeout(self.timeout),
            MercadoPagoApiError::JsonError(s) | MercadoPagoApiError::RestResponseError(s) => {
                GatewayError::InvalidResponse(s)
            },
            MercadoPagoApiError::RestRequestError(s) | MercadoPagoApiError::Initialization(s) => {
                GatewayError::Transport(s)
            },
        }
    }
}

impl PaymentGateway for MercadoPagoGateway {
    async fn create_pix_payment(&self, request: PixPaymentRequest) -> Result<PixPayment, GatewayError> {
        let body = NewPixPayment::new(
            request.amount.as_reais(),
            request.description,
            request.payer_email,
            request.external_reference.to_string(),
        );
        let payment = self
            .api
            .create_pix_payment(&body, request.external_reference.as_str())
            .await
            .map_err(|e| self.convert_error(e))?;
        pix_payment_from(payment)
    }

    async fn payment_status(&self, payment_id: &PaymentHandle) -> Result<PaymentStatusReport, GatewayError> {
        let payment = self.api.get_payment(payment_id.as_str()).await.map_err(|e| self.convert_error(e))?;
        status_report_from(payment)
    }
}

fn pix_payment_from(payment: MpPayment) -> Result<PixPayment, GatewayError> {
    let qr_payload = payment
        .qr_code()
        .filter(|s| !s.is_empty())
        .map(String::from)
        .ok_or_else(|| GatewayError::InvalidResponse(format!("Payment {} has no PIX QR code", payment.id)))?;
    let qr_image_base64 = payment.qr_code_base64().map(String::from);
    Ok(PixPayment {
        payment_id: PaymentHandle::from(payment.id),
        status: PaymentStatus::from(payment.status.as_str()),
        qr_payload,
        qr_image_base64,
    })
}

fn status_report_from(payment: MpPayment) -> Result<PaymentStatusReport, GatewayError> {
    let mut report =
        PaymentStatusReport::new(PaymentHandle::from(payment.id.as_str()), PaymentStatus::from(payment.status.as_str()));
    if let Some(reference) = payment.external_reference.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
        report = report.with_external_reference(OrderId::from(reference));
    }
    if let Some(amount) = payment.transaction_amount {
        let amount = Cents::from_reais_f64(amount).map_err(|e| {
            GatewayError::InvalidResponse(format!("Payment {} has an invalid amount. {e}", payment.id))
        })?;
        report = report.with_amount(amount);
    }
    Ok(report)
}
