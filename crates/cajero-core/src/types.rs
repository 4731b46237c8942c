//! # Domain Types
//!
//! Core domain types used throughout Cajero POS.
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │    Product      │   │    Document     │   │ CompanyProfile  │       │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────  │       │
//! │  │  id             │   │  id (UUID)      │   │  ruc            │       │
//! │  │  price_cents    │   │  series-number  │   │  legal_name     │       │
//! │  │  tax_category   │   │  client (copy)  │   │  ubigeo         │       │
//! │  │  unit_code      │   │  items, totals  │   │  series F/B/FC  │       │
//! │  └─────────────────┘   │  authority      │   └─────────────────┘       │
//! │                        └─────────────────┘                              │
//! │                                                                         │
//! │  Catalogue enums (authority codes):                                    │
//! │  TaxCategory (07) · UnitCode (03) · IdentityDocType (06)               │
//! │  DocumentKind (01/03/07 + internal 80) · PaymentTerm                    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Snapshot Pattern
//! A document embeds the client and every line BY VALUE. Editing a client or
//! a product afterwards never changes an issued document.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, FixedOffset, Offset, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{CoreError, CoreResult};
use crate::money::Money;
use crate::numbering::SeriesNumber;
use crate::tax::TaxBreakdown;

// =============================================================================
// Tax Category (Catalogue 07)
// =============================================================================

/// How a line is affected by the IGV.
///
/// | Variant      | Code | Scheme id | Scheme name |
/// |--------------|------|-----------|-------------|
/// | `Taxed`      | 10   | 1000      | IGV         |
/// | `Exempt`     | 20   | 9997      | EXO         |
/// | `Unaffected` | 30   | 9998      | INA         |
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
#[serde(rename_all = "snake_case")]
pub enum TaxCategory {
    Taxed,
    Exempt,
    Unaffected,
}

impl TaxCategory {
    /// Catalogue 07 affectation code, also the exemption reason code.
    pub const fn code(&self) -> &'static str {
        match self {
            TaxCategory::Taxed => "10",
            TaxCategory::Exempt => "20",
            TaxCategory::Unaffected => "30",
        }
    }

    pub const fn scheme_id(&self) -> &'static str {
        match self {
            TaxCategory::Taxed => "1000",
            TaxCategory::Exempt => "9997",
            TaxCategory::Unaffected => "9998",
        }
    }

    pub const fn scheme_name(&self) -> &'static str {
        match self {
            TaxCategory::Taxed => "IGV",
            TaxCategory::Exempt => "EXO",
            TaxCategory::Unaffected => "INA",
        }
    }

    /// Percent printed on each invoice line.
    pub const fn percent(&self) -> &'static str {
        match self {
            TaxCategory::Taxed => "18.00",
            TaxCategory::Exempt | TaxCategory::Unaffected => "0.00",
        }
    }

    pub fn from_code(code: &str) -> CoreResult<Self> {
        match code {
            "10" => Ok(TaxCategory::Taxed),
            "20" => Ok(TaxCategory::Exempt),
            "30" => Ok(TaxCategory::Unaffected),
            other => Err(CoreError::UnknownCode {
                catalogue: "tax category",
                code: other.to_string(),
            }),
        }
    }
}

impl FromStr for TaxCategory {
    type Err = CoreError;

    /// Accepts the English name, the Spanish name, the scheme name or the code.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "taxed" | "gravado" | "igv" => Ok(TaxCategory::Taxed),
            "exempt" | "exonerado" | "exo" => Ok(TaxCategory::Exempt),
            "unaffected" | "inafecto" | "ina" => Ok(TaxCategory::Unaffected),
            other => TaxCategory::from_code(other),
        }
    }
}

/// Every tax category carries this tax type code.
pub const TAX_TYPE_CODE: &str = "VAT";

// =============================================================================
// Unit Code (Catalogue 03)
// =============================================================================

/// Commercial unit of measure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "UPPERCASE"))]
#[serde(rename_all = "UPPERCASE")]
pub enum UnitCode {
    /// Unit (goods).
    Niu,
    /// Service (intangibles).
    Zz,
    /// Kilograms.
    Kgm,
    /// Litres.
    Ltr,
    /// Box.
    Bx,
    /// Gallons.
    Gll,
}

impl UnitCode {
    pub const fn code(&self) -> &'static str {
        match self {
            UnitCode::Niu => "NIU",
            UnitCode::Zz => "ZZ",
            UnitCode::Kgm => "KGM",
            UnitCode::Ltr => "LTR",
            UnitCode::Bx => "BX",
            UnitCode::Gll => "GLL",
        }
    }
}

impl Default for UnitCode {
    fn default() -> Self {
        UnitCode::Niu
    }
}

impl FromStr for UnitCode {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "NIU" => Ok(UnitCode::Niu),
            "ZZ" => Ok(UnitCode::Zz),
            "KGM" => Ok(UnitCode::Kgm),
            "LTR" => Ok(UnitCode::Ltr),
            "BX" => Ok(UnitCode::Bx),
            "GLL" => Ok(UnitCode::Gll),
            other => Err(CoreError::UnknownCode {
                catalogue: "unit",
                code: other.to_string(),
            }),
        }
    }
}

// =============================================================================
// Identity Document Type (Catalogue 06)
// =============================================================================

/// Type of the identity document a client presents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
#[serde(rename_all = "snake_case")]
pub enum IdentityDocType {
    /// No document ("-").
    None,
    Dni,
    ForeignerCard,
    Ruc,
    Passport,
}

impl IdentityDocType {
    /// Catalogue 06 code used as `schemeID` and in the summary payload.
    pub const fn code(&self) -> &'static str {
        match self {
            IdentityDocType::None => "0",
            IdentityDocType::Dni => "1",
            IdentityDocType::ForeignerCard => "4",
            IdentityDocType::Ruc => "6",
            IdentityDocType::Passport => "7",
        }
    }

    /// Short label shown to the cashier.
    pub const fn label(&self) -> &'static str {
        match self {
            IdentityDocType::None => "-",
            IdentityDocType::Dni => "DNI",
            IdentityDocType::ForeignerCard => "CE",
            IdentityDocType::Ruc => "RUC",
            IdentityDocType::Passport => "PASAPORTE",
        }
    }

    pub fn from_code(code: &str) -> CoreResult<Self> {
        match code {
            "0" => Ok(IdentityDocType::None),
            "1" => Ok(IdentityDocType::Dni),
            "4" => Ok(IdentityDocType::ForeignerCard),
            "6" => Ok(IdentityDocType::Ruc),
            "7" => Ok(IdentityDocType::Passport),
            other => Err(CoreError::UnknownCode {
                catalogue: "identity document",
                code: other.to_string(),
            }),
        }
    }
}

impl FromStr for IdentityDocType {
    type Err = CoreError;

    /// Accepts either the label (`DNI`, `RUC`, `-`) or the catalogue code.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "-" | "NONE" => Ok(IdentityDocType::None),
            "DNI" => Ok(IdentityDocType::Dni),
            "CE" => Ok(IdentityDocType::ForeignerCard),
            "RUC" => Ok(IdentityDocType::Ruc),
            "PASAPORTE" | "PASSPORT" => Ok(IdentityDocType::Passport),
            other => IdentityDocType::from_code(other),
        }
    }
}

// =============================================================================
// Document Kind
// =============================================================================

/// The kind of sales document.
///
/// ```text
/// Invoice (01)     Factura          legal, requires a RUC client
/// Receipt (03)     Boleta           legal, any client
/// CreditNote (07)  Nota de Crédito  legal, never issued from a cart
/// SaleNote (80)    Nota de Venta    internal, never sent to the authority
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
#[serde(rename_all = "snake_case")]
pub enum DocumentKind {
    Invoice,
    Receipt,
    CreditNote,
    SaleNote,
}

impl DocumentKind {
    /// Type code printed on documents and in the summary payload.
    ///
    /// `80` is internal and never leaves the terminal as an authority code.
    pub const fn code(&self) -> &'static str {
        match self {
            DocumentKind::Invoice => "01",
            DocumentKind::Receipt => "03",
            DocumentKind::CreditNote => "07",
            DocumentKind::SaleNote => "80",
        }
    }

    /// Authority code, `None` for internal documents.
    pub const fn authority_code(&self) -> Option<&'static str> {
        match self {
            DocumentKind::SaleNote => None,
            other => Some(other.code()),
        }
    }

    /// Whether documents of this kind are submitted to the authority.
    pub const fn is_fiscal(&self) -> bool {
        !matches!(self, DocumentKind::SaleNote)
    }

    pub const fn label(&self) -> &'static str {
        match self {
            DocumentKind::Invoice => "Factura",
            DocumentKind::Receipt => "Boleta",
            DocumentKind::CreditNote => "Nota de Crédito",
            DocumentKind::SaleNote => "Nota de Venta",
        }
    }

    pub fn from_code(code: &str) -> CoreResult<Self> {
        match code {
            "01" => Ok(DocumentKind::Invoice),
            "03" => Ok(DocumentKind::Receipt),
            "07" => Ok(DocumentKind::CreditNote),
            "80" => Ok(DocumentKind::SaleNote),
            other => Err(CoreError::UnknownCode {
                catalogue: "document kind",
                code: other.to_string(),
            }),
        }
    }
}

impl fmt::Display for DocumentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for DocumentKind {
    type Err = CoreError;

    /// Accepts the English name, the Spanish name or the type code.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "invoice" | "factura" => Ok(DocumentKind::Invoice),
            "receipt" | "boleta" => Ok(DocumentKind::Receipt),
            "credit-note" | "credit_note" | "nota-credito" => Ok(DocumentKind::CreditNote),
            "sale-note" | "sale_note" | "nota-venta" => Ok(DocumentKind::SaleNote),
            other => DocumentKind::from_code(other),
        }
    }
}

// =============================================================================
// Payment Term
// =============================================================================

/// Payment form ("Forma de Pago"), mandatory in UBL 2.1.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[serde(rename_all = "lowercase")]
pub enum PaymentTerm {
    #[default]
    Cash,
    Credit,
}

impl PaymentTerm {
    pub const fn as_str(&self) -> &'static str {
        match self {
            PaymentTerm::Cash => "Contado",
            PaymentTerm::Credit => "Credito",
        }
    }
}

impl FromStr for PaymentTerm {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "cash" | "contado" => Ok(PaymentTerm::Cash),
            "credit" | "credito" => Ok(PaymentTerm::Credit),
            other => Err(CoreError::UnknownCode {
                catalogue: "payment term",
                code: other.to_string(),
            }),
        }
    }
}

// =============================================================================
// Authority Status
// =============================================================================

/// Where a document stands with the tax authority.
///
/// ```text
///            ┌──► Accepted
/// Pending ───┼──► Rejected
///            └──► Internal   (sale notes)
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[serde(rename_all = "lowercase")]
pub enum AuthorityStatus {
    Pending,
    Accepted,
    Rejected,
    Internal,
}

impl AuthorityStatus {
    pub const fn is_terminal(&self) -> bool {
        !matches!(self, AuthorityStatus::Pending)
    }
}

// =============================================================================
// Client
// =============================================================================

/// A customer, as stored and as snapshotted into documents.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Client {
    /// Store id; `None` until the client has been persisted.
    pub id: Option<String>,
    pub doc_type: IdentityDocType,
    pub doc_number: String,
    pub name: String,
    pub address: String,
    pub phone: Option<String>,
    pub email: Option<String>,
}

impl Client {
    /// Walk-in customer without document.
    pub fn anonymous() -> Self {
        Client {
            id: None,
            doc_type: IdentityDocType::None,
            doc_number: "-".to_string(),
            name: "CLIENTES VARIOS".to_string(),
            address: String::new(),
            phone: None,
            email: None,
        }
    }

    pub fn is_undocumented(&self) -> bool {
        self.doc_type == IdentityDocType::None
    }

    /// A blank name or the placeholder `-` is not a valid document recipient.
    pub fn has_valid_name(&self) -> bool {
        let name = self.name.trim();
        !name.is_empty() && name != "-"
    }
}

// =============================================================================
// Product
// =============================================================================

/// A catalogue product. `price_cents` is the final, tax-inclusive price.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Product {
    pub id: String,
    pub name: String,
    pub category: String,
    pub description: Option<String>,
    pub price_cents: i64,
    pub stock: i64,
    pub tax_category: TaxCategory,
    pub unit_code: UnitCode,
}

impl Product {
    #[inline]
    pub fn price(&self) -> Money {
        Money::from_cents(self.price_cents)
    }

    /// Creates a line item snapshot of this product.
    pub fn to_line(&self, quantity: i64) -> LineItem {
        LineItem {
            product_id: self.id.clone(),
            description: self.name.clone(),
            unit_price: self.price(),
            quantity,
            tax_category: self.tax_category,
            unit_code: self.unit_code,
        }
    }
}

// =============================================================================
// Line Item
// =============================================================================

/// One product line. The unit price includes IGV when the line is taxed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineItem {
    pub product_id: String,
    pub description: String,
    pub unit_price: Money,
    pub quantity: i64,
    pub tax_category: TaxCategory,
    pub unit_code: UnitCode,
}

impl LineItem {
    /// Tax-inclusive line total (unit price × quantity).
    #[inline]
    pub fn line_total(&self) -> Money {
        self.unit_price.multiply_quantity(self.quantity)
    }
}

// =============================================================================
// Authority Response & Record
// =============================================================================

/// What the submission adapter reports back for one document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthorityResponse {
    pub success: bool,
    pub description: String,
    /// Signed XML on acceptance; the unsigned XML on rejection; empty for
    /// internal documents.
    pub signed_xml: String,
    pub digest: Option<String>,
    pub cdr_reference: Option<String>,
    pub ticket: Option<String>,
}

/// The authority outcome stored with a document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthorityRecord {
    pub status: AuthorityStatus,
    pub description: String,
    pub signed_xml: Option<String>,
    pub digest: Option<String>,
    pub ticket: Option<String>,
    pub cdr_reference: Option<String>,
}

impl AuthorityRecord {
    pub fn pending() -> Self {
        AuthorityRecord {
            status: AuthorityStatus::Pending,
            description: String::new(),
            signed_xml: None,
            digest: None,
            ticket: None,
            cdr_reference: None,
        }
    }
}

// =============================================================================
// Document
// =============================================================================

/// An issued sales document.
///
/// Created once at checkout; afterwards only `authority` changes, exactly
/// once (see [`Document::record_response`]).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    /// UUID v4.
    pub id: String,
    pub kind: DocumentKind,
    pub series: String,
    pub correlative: u32,
    /// Issue instant in the issuer's local offset.
    pub issued_at: DateTime<FixedOffset>,
    pub client: Client,
    pub payment_term: PaymentTerm,
    pub items: Vec<LineItem>,
    pub totals: TaxBreakdown,
    /// Summary (QR) payload, see [`crate::summary`].
    pub summary: String,
    pub authority: AuthorityRecord,
}

impl Document {
    /// Creates a pending document with a fresh id.
    pub fn issue(
        kind: DocumentKind,
        number: SeriesNumber,
        issued_at: DateTime<FixedOffset>,
        client: Client,
        payment_term: PaymentTerm,
        items: Vec<LineItem>,
        totals: TaxBreakdown,
    ) -> Self {
        Document {
            id: uuid::Uuid::new_v4().to_string(),
            kind,
            series: number.series,
            correlative: number.correlative,
            issued_at,
            client,
            payment_term,
            items,
            totals,
            summary: String::new(),
            authority: AuthorityRecord::pending(),
        }
    }

    /// Full number, e.g. `B001-00000042`.
    pub fn number(&self) -> String {
        SeriesNumber::new(self.series.clone(), self.correlative).to_string()
    }

    /// Local issue date, `YYYY-MM-DD`.
    pub fn issue_date(&self) -> String {
        self.issued_at.format("%Y-%m-%d").to_string()
    }

    /// Local issue time, `HH:MM:SS`.
    pub fn issue_time(&self) -> String {
        self.issued_at.format("%H:%M:%S").to_string()
    }

    /// Merges the authority outcome into the document.
    ///
    /// ```text
    /// SaleNote          ──► Internal
    /// response.success  ──► Accepted
    /// otherwise         ──► Rejected
    /// ```
    pub fn record_response(&mut self, response: &AuthorityResponse) -> CoreResult<()> {
        if self.authority.status.is_terminal() {
            return Err(CoreError::AuthorityAlreadyRecorded {
                number: self.number(),
                status: self.authority.status,
            });
        }

        let status = if self.kind == DocumentKind::SaleNote {
            AuthorityStatus::Internal
        } else if response.success {
            AuthorityStatus::Accepted
        } else {
            AuthorityStatus::Rejected
        };

        self.authority = AuthorityRecord {
            status,
            description: response.description.clone(),
            signed_xml: Some(response.signed_xml.clone()),
            digest: response.digest.clone(),
            ticket: response.ticket.clone(),
            cdr_reference: response.cdr_reference.clone(),
        };
        Ok(())
    }
}

// =============================================================================
// Company Profile
// =============================================================================

/// Default issuer offset: Peru (UTC-05:00).
pub const DEFAULT_UTC_OFFSET_MINUTES: i32 = -300;

/// The issuing company. Singleton, passed explicitly to whoever needs it.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompanyProfile {
    pub ruc: String,
    pub legal_name: String,
    pub address: String,
    /// Registration address code, e.g. `150101`.
    pub ubigeo: String,
    pub sol_user: String,
    pub sol_password: String,
    pub invoice_series: String,
    pub receipt_series: String,
    pub credit_note_series: String,
    pub logo_url: Option<String>,
    pub lookup_token: Option<String>,
    pub messaging_instance: Option<String>,
    pub messaging_token: Option<String>,
    pub utc_offset_minutes: i32,
}

impl CompanyProfile {
    /// Sandbox profile used by the seed binary and tests.
    pub fn demo() -> Self {
        CompanyProfile {
            ruc: "20123456789".to_string(),
            legal_name: "MI EMPRESA DEMO S.A.C.".to_string(),
            address: "Av. Pruebas 123, Lima".to_string(),
            ubigeo: "150101".to_string(),
            sol_user: "MODDATOS".to_string(),
            sol_password: "MODDATOS".to_string(),
            invoice_series: "F001".to_string(),
            receipt_series: "B001".to_string(),
            credit_note_series: "FC01".to_string(),
            logo_url: None,
            lookup_token: None,
            messaging_instance: None,
            messaging_token: None,
            utc_offset_minutes: DEFAULT_UTC_OFFSET_MINUTES,
        }
    }

    /// Issuer's local offset. Out-of-range values fall back to UTC.
    pub fn offset(&self) -> FixedOffset {
        FixedOffset::east_opt(self.utc_offset_minutes * 60).unwrap_or_else(|| Utc.fix())
    }

    /// Current instant in the issuer's local offset.
    pub fn local_now(&self) -> DateTime<FixedOffset> {
        Utc::now().with_timezone(&self.offset())
    }
}

// Credentials stay out of logs.
impl fmt::Debug for CompanyProfile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CompanyProfile")
            .field("ruc", &self.ruc)
            .field("legal_name", &self.legal_name)
            .field("ubigeo", &self.ubigeo)
            .field("sol_user", &self.sol_user)
            .field("sol_password", &"***")
            .field("invoice_series", &self.invoice_series)
            .field("receipt_series", &self.receipt_series)
            .field("credit_note_series", &self.credit_note_series)
            .field("lookup_token", &self.lookup_token.as_ref().map(|_| "***"))
            .field("messaging_instance", &self.messaging_instance)
            .field("messaging_token", &self.messaging_token.as_ref().map(|_| "***"))
            .field("utc_offset_minutes", &self.utc_offset_minutes)
            .finish()
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
