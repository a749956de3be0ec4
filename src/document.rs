use serde::{Deserialize, Serialize};

/// Business payload for an "introduce goods" document.
///
/// The client never looks inside this; it is serialized to JSON, base64
/// encoded and shipped as the `product_document` field of the envelope.
/// Fields follow the CRPT LP_INTRODUCE_GOODS schema; optional ones are
/// omitted from the JSON when unset.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProductDocument {
    pub participant_inn: String,
    pub production_date: String,
    pub usage_type: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub owner_inn: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub producer_inn: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub production_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub products: Option<Vec<Product>>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Product {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub certificate_document: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tnved_code: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub uit_code: Option<String>,
}

/// Wire envelope for `POST /api/v3/lk/documents/create`. Field order matches
/// the documented contract; serde_json preserves declaration order.
#[derive(Debug, Serialize)]
pub struct CreateDocumentBody {
    pub document_format: &'static str,
    pub product_document: String,
    pub product_group: String,
    pub signature: String,
    #[serde(rename = "type")]
    pub doc_type: &'static str,
}

pub const DOCUMENT_FORMAT_MANUAL: &str = "MANUAL";
pub const DOC_TYPE_INTRODUCE_GOODS: &str = "LP_INTRODUCE_GOODS";
