//! DNI/RUC lookup.
//!
//! Providers disagree on the response shape, so the JSON is normalized by
//! [`normalize_lookup_response`] before it becomes an [`IdentityRecord`].

use async_trait::async_trait;
use cajero_core::IdentityDocType;
use reqwest::{Client, StatusCode};
use serde_json::Value;
use tracing::{debug, warn};
use url::Url;

use super::{IdentityLookup, IdentityRecord};
use crate::config::IntegrationSettings;
use crate::error::{IntegrationError, IntegrationResult};

/// First non-empty string among `keys`.
fn first_str<'a>(data: &'a Value, keys: &[&str]) -> Option<&'a str> {
    keys.iter()
        .filter_map(|key| data.get(*key).and_then(Value::as_str))
        .map(str::trim)
        .find(|s| !s.is_empty())
}

fn join_name_parts(parts: [Option<&str>; 3]) -> String {
    parts
        .iter()
        .flatten()
        .copied()
        .collect::<Vec<_>>()
        .join(" ")
        .trim()
        .to_string()
}

/// Maps a provider response to an identity record.
///
/// The payload may be wrapped in `data` or `result`. Returns `None` when no
/// name can be found.
pub fn normalize_lookup_response(
    doc_type: IdentityDocType,
    number: &str,
    raw: &Value,
) -> Option<IdentityRecord> {
    let data = raw
        .get("data")
        .filter(|v| !v.is_null())
        .or_else(|| raw.get("result").filter(|v| !v.is_null()))
        .unwrap_or(raw);

    match doc_type {
        IdentityDocType::Dni => {
            let name = if let Some(full) = first_str(data, &["full_name"]) {
                full.to_string()
            } else if first_str(data, &["first_name", "first_last_name"]).is_some() {
                join_name_parts([
                    first_str(data, &["first_name"]),
                    first_str(data, &["first_last_name"]),
                    first_str(data, &["second_last_name"]),
                ])
            } else {
                join_name_parts([
                    first_str(data, &["nombres", "Nombres", "nombre"]),
                    first_str(data, &["apellidoPaterno", "apellido_paterno", "ApellidoPaterno"]),
                    first_str(data, &["apellidoMaterno", "apellido_materno", "ApellidoMaterno"]),
                ])
            };
            if name.is_empty() {
                return None;
            }

            Some(IdentityRecord {
                doc_type,
                doc_number: first_str(data, &["document_number", "dni"])
                    .unwrap_or(number)
                    .to_string(),
                name,
                address: String::new(),
            })
        }
        IdentityDocType::Ruc => {
            let name = first_str(
                data,
                &["razonSocial", "razon_social", "nombreComercial", "nombre_comercial", "nombre"],
            )?;

            let address = match first_str(data, &["direccion", "direccion_completa"]) {
                Some(address) => address.to_string(),
                None => compose_address(data),
            };

            Some(IdentityRecord {
                doc_type,
                doc_number: first_str(data, &["ruc"]).unwrap_or(number).to_string(),
                name: name.to_string(),
                address,
            })
        }
        _ => None,
    }
}

/// `department - province - district`, with one dangling separator trimmed
/// at each end.
fn compose_address(data: &Value) -> String {
    let dep = first_str(data, &["departamento"]);
    let prov = first_str(data, &["provincia"]);
    let dist = first_str(data, &["distrito"]);
    if dep.is_none() && prov.is_none() && dist.is_none() {
        return String::new();
    }

    let joined = format!(
        "{} - {} - {}",
        dep.unwrap_or_default(),
        prov.unwrap_or_default(),
        dist.unwrap_or_default()
    );
    let joined = joined.strip_prefix(" - ").unwrap_or(&joined);
    joined.strip_suffix(" - ").unwrap_or(joined).to_string()
}

fn endpoint_path(doc_type: IdentityDocType) -> IntegrationResult<&'static str> {
    match doc_type {
        IdentityDocType::Dni => Ok("reniec/dni"),
        IdentityDocType::Ruc => Ok("sunat/ruc"),
        other => Err(IntegrationError::UnsupportedDocument(other.label())),
    }
}

/// Builds `{base}/reniec/dni?numero=...` or `{base}/sunat/ruc?numero=...`.
pub fn lookup_url(base_url: &str, doc_type: IdentityDocType, number: &str) -> IntegrationResult<Url> {
    let path = endpoint_path(doc_type)?;
    let url = Url::parse_with_params(
        &format!("{}/{}", base_url.trim_end_matches('/'), path),
        &[("numero", number)],
    )?;
    Ok(url)
}

/// Lookup against the configured HTTP provider.
pub struct HttpIdentityLookup {
    client: Client,
    base_url: String,
    token: Option<String>,
}

impl HttpIdentityLookup {
    pub fn new(settings: &IntegrationSettings, token: Option<String>) -> IntegrationResult<Self> {
        let client = Client::builder()
            .timeout(settings.request_timeout())
            .build()?;
        Ok(HttpIdentityLookup {
            client,
            base_url: settings.lookup_base_url.clone(),
            token: token.filter(|t| !t.trim().is_empty()),
        })
    }
}

#[async_trait]
impl IdentityLookup for HttpIdentityLookup {
    async fn lookup(
        &self,
        doc_type: IdentityDocType,
        number: &str,
    ) -> IntegrationResult<Option<IdentityRecord>> {
        let token = self
            .token
            .as_deref()
            .ok_or(IntegrationError::NotConfigured("lookup token"))?;
        let url = lookup_url(&self.base_url, doc_type, number)?;

        debug!(doc_type = doc_type.label(), number, "Looking up identity document");
        let response = self.client.get(url).bearer_auth(token).send().await?;

        match response.status() {
            StatusCode::NOT_FOUND | StatusCode::UNPROCESSABLE_ENTITY => {
                warn!(number, "Identity document not found by provider");
                return Ok(None);
            }
            status if !status.is_success() => {
                return Err(IntegrationError::Status(status.as_u16()));
            }
            _ => {}
        }

        let raw: Value = response.json().await?;
        Ok(normalize_lookup_response(doc_type, number, &raw))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_dni_full_name_inside_data() {
        let raw = json!({ "data": { "full_name": "JUAN PEREZ LOPEZ", "document_number": "44556677" } });
        let record = normalize_lookup_response(IdentityDocType::Dni, "44556677", &raw).unwrap();
        assert_eq!(record.name, "JUAN PEREZ LOPEZ");
        assert_eq!(record.doc_number, "44556677");
        assert!(record.address.is_empty());
    }

    #[test]
    fn test_dni_from_name_parts() {
        let english = json!({ "first_name": "ANA", "first_last_name": "TORRES" });
        let record = normalize_lookup_response(IdentityDocType::Dni, "11223344", &english).unwrap();
        assert_eq!(record.name, "ANA TORRES");
        assert_eq!(record.doc_number, "11223344");

        let spanish = json!({
            "result": { "nombres": "LUIS", "apellidoPaterno": "QUISPE", "apellido_materno": "MAMANI", "dni": "99887766" }
        });
        let record = normalize_lookup_response(IdentityDocType::Dni, "x", &spanish).unwrap();
        assert_eq!(record.name, "LUIS QUISPE MAMANI");
        assert_eq!(record.doc_number, "99887766");
    }

    #[test]
    fn test_dni_without_name_is_none() {
        let raw = json!({ "data": { "dni": "44556677" } });
        assert!(normalize_lookup_response(IdentityDocType::Dni, "44556677", &raw).is_none());
    }

    #[test]
    fn test_ruc_address_variants() {
        let direct = json!({ "razon_social": "ACME S.A.C.", "direccion": "AV. LIMA 100" });
        let record = normalize_lookup_response(IdentityDocType::Ruc, "20100070970", &direct).unwrap();
        assert_eq!(record.name, "ACME S.A.C.");
        assert_eq!(record.address, "AV. LIMA 100");
        assert_eq!(record.doc_number, "20100070970");

        let parts = json!({
            "razonSocial": "ACME S.A.C.",
            "departamento": "LIMA",
            "provincia": "LIMA",
            "distrito": "MIRAFLORES",
        });
        let record = normalize_lookup_response(IdentityDocType::Ruc, "20100070970", &parts).unwrap();
        assert_eq!(record.address, "LIMA - LIMA - MIRAFLORES");

        let district_only = json!({ "nombre": "ACME", "distrito": "SURCO" });
        let record = normalize_lookup_response(IdentityDocType::Ruc, "1", &district_only).unwrap();
        assert_eq!(record.address, " - SURCO");
    }

    #[test]
    fn test_lookup_url() {
        let url = lookup_url("https://api.decolecta.com/v1/", IdentityDocType::Ruc, "20100070970").unwrap();
        assert_eq!(url.as_str(), "https://api.decolecta.com/v1/sunat/ruc?numero=20100070970");

        assert!(matches!(
            lookup_url("https://x", IdentityDocType::Passport, "1"),
            Err(IntegrationError::UnsupportedDocument(_))
        ));
    }

    #[tokio::test]
    async fn test_missing_token_is_not_configured() {
        let lookup = HttpIdentityLookup::new(&IntegrationSettings::default(), Some("  ".into())).unwrap();
        let err = lookup.lookup(IdentityDocType::Dni, "44556677").await.unwrap_err();
        assert!(matches!(err, IntegrationError::NotConfigured(_)));
    }
}
