use serde::{Deserialize, Deserializer, Serialize};

/// Request body for `POST /v1/payments`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NewPixPayment {
    /// In reais.
    pub transaction_amount: f64,
    pub description: String,
    pub payment_method_id: String,
    pub payer: MpPayer,
    pub external_reference: String,
}

impl NewPixPayment {
    pub fn new(transaction_amount: f64, description: String, payer_email: String, external_reference: String) -> Self {
        Self {
            transaction_amount,
            description,
            payment_method_id: "pix".to_string(),
            payer: MpPayer { email: payer_email },
            external_reference,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MpPayer {
    pub email: String,
}

/// The subset of the payment resource that the checkout uses. Every other field is ignored.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct MpPayment {
    #[serde(deserialize_with = "string_or_number")]
    pub id: String,
    pub status: String,
    #[serde(default)]
    pub status_detail: Option<String>,
    #[serde(default)]
    pub external_reference: Option<String>,
    #[serde(default)]
    pub transaction_amount: Option<f64>,
    #[serde(default)]
    pub point_of_interaction: Option<PointOfInteraction>,
}

impl MpPayment {
    pub fn transaction_data(&self) -> Option<&TransactionData> {
        self.point_of_interaction.as_ref().and_then(|p| p.transaction_data.as_ref())
    }

    /// The PIX copy-and-paste code.
    pub fn qr_code(&self) -> Option<&str> {
        self.transaction_data().and_then(|d| d.qr_code.as_deref())
    }

    pub fn qr_code_base64(&self) -> Option<&str> {
        self.transaction_data().and_then(|d| d.qr_code_base64.as_deref())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct PointOfInteraction {
    #[serde(default)]
    pub transaction_data: Option<TransactionData>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct TransactionData {
    #[serde(default)]
    pub qr_code: Option<String>,
    #[serde(default)]
    pub qr_code_base64: Option<String>,
    #[serde(default)]
    pub ticket_url: Option<String>,
}

fn string_or_number<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Id {
        Number(u64),
        Text(String),
    }
    Ok(match Id::deserialize(deserializer)? {
        Id::Number(n) => n.to_string(),
        Id::Text(s) => s,
    })
}
