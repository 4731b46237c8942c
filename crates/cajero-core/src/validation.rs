//! # Validation Module
//!
//! Input validation and checkout preconditions for Cajero POS.
//!
//! ## Validation Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Validation Layers                                  │
//! │                                                                         │
//! │  Layer 1: Terminal (CLI / cart)                                        │
//! │  ├── Quantity and price checks as items are added                      │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 2: THIS MODULE                                                  │
//! │  ├── validate_checkout: client, kind, confirmation                     │
//! │  └── validate_lines: prices and quantities                             │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 3: Database (SQLite)                                            │
//! │  ├── NOT NULL / CHECK constraints                                      │
//! │  └── UNIQUE (kind, series, correlative)                                │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Every check here runs before anything is numbered or submitted, so a
//! failure leaves the cart and the history untouched.

use crate::error::ValidationError;
use crate::types::{Client, CompanyProfile, DocumentKind, IdentityDocType, LineItem, Product};
use crate::{MAX_CART_ITEMS, MAX_ITEM_QUANTITY, MAX_PRICE_CENTS};

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

// =============================================================================
// Checkout Preconditions
// =============================================================================

/// Checks that a cart may become a document of `kind` for `client`.
///
/// ## Rules (in order)
/// ```text
/// kind is CreditNote                     → KindNotIssuable
/// no lines                               → EmptyCart
/// no client                              → Required("client")
/// blank or "-" client name               → Required("client name")
/// Invoice and client has no RUC          → ClientDocumentMismatch(RUC)
/// Receipt, undocumented, not confirmed   → ConfirmationRequired
/// bad price / quantity on any line       → validate_lines
/// ```
pub fn validate_checkout(
    kind: DocumentKind,
    client: Option<&Client>,
    lines: &[LineItem],
    confirm_undocumented: bool,
) -> ValidationResult<()> {
    if kind == DocumentKind::CreditNote {
        return Err(ValidationError::KindNotIssuable {
            kind: kind.label().to_string(),
        });
    }

    if lines.is_empty() {
        return Err(ValidationError::EmptyCart);
    }

    let client = client.ok_or_else(|| ValidationError::Required {
        field: "client".to_string(),
    })?;

    if !client.has_valid_name() {
        return Err(ValidationError::Required {
            field: "client name".to_string(),
        });
    }

    if kind == DocumentKind::Invoice && client.doc_type != IdentityDocType::Ruc {
        return Err(ValidationError::ClientDocumentMismatch {
            kind: kind.label().to_string(),
            required: IdentityDocType::Ruc.label().to_string(),
        });
    }

    if kind == DocumentKind::Receipt && client.is_undocumented() && !confirm_undocumented {
        return Err(ValidationError::ConfirmationRequired {
            reason: "the client has no identity document; a Boleta is only allowed for small amounts"
                .to_string(),
        });
    }

    validate_lines(lines)
}

/// Validates every line: price within 0..=MAX_PRICE_CENTS, quantity within 1..=999.
pub fn validate_lines(lines: &[LineItem]) -> ValidationResult<()> {
    if lines.len() > MAX_CART_ITEMS {
        return Err(ValidationError::OutOfRange {
            field: "cart items".to_string(),
            min: 1,
            max: MAX_CART_ITEMS as i64,
        });
    }

    for line in lines {
        validate_price_cents(line.unit_price.cents())?;
        validate_quantity(line.quantity)?;
    }
    Ok(())
}

// =============================================================================
// Numeric Validators
// =============================================================================

/// Validates a quantity value.
///
/// ## Rules
/// - Must be positive (> 0)
/// - Must not exceed MAX_ITEM_QUANTITY (999)
pub fn validate_quantity(qty: i64) -> ValidationResult<()> {
    if qty <= 0 {
        return Err(ValidationError::MustBePositive {
            field: "quantity".to_string(),
        });
    }

    if qty > MAX_ITEM_QUANTITY {
        return Err(ValidationError::OutOfRange {
            field: "quantity".to_string(),
            min: 1,
            max: MAX_ITEM_QUANTITY,
        });
    }

    Ok(())
}

/// Validates a price in céntimos.
///
/// ## Example
/// ```rust
/// use cajero_core::validation::validate_price_cents;
///
/// assert!(validate_price_cents(1180).is_ok());
/// assert!(validate_price_cents(0).is_ok());     // Free item
/// assert!(validate_price_cents(-100).is_err());
/// assert!(validate_price_cents(i64::MAX / 100).is_err());
/// ```
pub fn validate_price_cents(cents: i64) -> ValidationResult<()> {
    if !(0..=MAX_PRICE_CENTS).contains(&cents) {
        return Err(ValidationError::OutOfRange {
            field: "price".to_string(),
            min: 0,
            max: MAX_PRICE_CENTS,
        });
    }

    Ok(())
}

/// Validates a cart size before adding another line.
pub fn validate_cart_size(current_items: usize) -> ValidationResult<()> {
    if current_items >= MAX_CART_ITEMS {
        return Err(ValidationError::OutOfRange {
            field: "cart items".to_string(),
            min: 1,
            max: MAX_CART_ITEMS as i64,
        });
    }

    Ok(())
}

// =============================================================================
// Identity Validators
// =============================================================================

fn validate_digits(field: &str, value: &str, len: usize) -> ValidationResult<()> {
    if value.trim().is_empty() {
        return Err(ValidationError::Required {
            field: field.to_string(),
        });
    }

    if value.len() != len || !value.chars().all(|c| c.is_ascii_digit()) {
        return Err(ValidationError::InvalidFormat {
            field: field.to_string(),
            reason: format!("must be exactly {} digits", len),
        });
    }

    Ok(())
}

/// RUC: 11 digits.
pub fn validate_ruc(ruc: &str) -> ValidationResult<()> {
    validate_digits("RUC", ruc, 11)
}

/// DNI: 8 digits.
pub fn validate_dni(dni: &str) -> ValidationResult<()> {
    validate_digits("DNI", dni, 8)
}

/// Ubigeo: 6 digits.
pub fn validate_ubigeo(ubigeo: &str) -> ValidationResult<()> {
    validate_digits("ubigeo", ubigeo, 6)
}

/// Validates a document series such as `F001` or `B001`.
///
/// ## Rules
/// - Exactly four characters
/// - Uppercase letters and digits only
pub fn validate_series(field: &str, series: &str) -> ValidationResult<()> {
    if series.trim().is_empty() {
        return Err(ValidationError::Required {
            field: field.to_string(),
        });
    }

    if series.len() != 4
        || !series
            .chars()
            .all(|c| c.is_ascii_uppercase() || c.is_ascii_digit())
    {
        return Err(ValidationError::InvalidFormat {
            field: field.to_string(),
            reason: "must be four uppercase letters or digits".to_string(),
        });
    }

    Ok(())
}

/// Validates a client before it is stored.
pub fn validate_client(client: &Client) -> ValidationResult<()> {
    if !client.has_valid_name() {
        return Err(ValidationError::Required {
            field: "client name".to_string(),
        });
    }

    if client.name.len() > 200 {
        return Err(ValidationError::TooLong {
            field: "client name".to_string(),
            max: 200,
        });
    }

    match client.doc_type {
        IdentityDocType::Ruc => validate_ruc(&client.doc_number),
        IdentityDocType::Dni => validate_dni(&client.doc_number),
        IdentityDocType::None => Ok(()),
        IdentityDocType::ForeignerCard | IdentityDocType::Passport => {
            if client.doc_number.trim().is_empty() {
                Err(ValidationError::Required {
                    field: "document number".to_string(),
                })
            } else {
                Ok(())
            }
        }
    }
}

/// Validates a catalogue product before it is stored.
pub fn validate_product(product: &Product) -> ValidationResult<()> {
    if product.name.trim().is_empty() {
        return Err(ValidationError::Required {
            field: "product name".to_string(),
        });
    }

    if product.name.len() > 200 {
        return Err(ValidationError::TooLong {
            field: "product name".to_string(),
            max: 200,
        });
    }

    validate_price_cents(product.price_cents)?;

    if product.stock < 0 {
        return Err(ValidationError::OutOfRange {
            field: "stock".to_string(),
            min: 0,
            max: i64::MAX,
        });
    }

    Ok(())
}

/// Validates the company profile before it is saved.
pub fn validate_company_profile(profile: &CompanyProfile) -> ValidationResult<()> {
    validate_ruc(&profile.ruc)?;

    if profile.legal_name.trim().is_empty() {
        return Err(ValidationError::Required {
            field: "legal name".to_string(),
        });
    }

    validate_ubigeo(&profile.ubigeo)?;
    validate_series("invoice series", &profile.invoice_series)?;
    validate_series("receipt series", &profile.receipt_series)?;
    validate_series("credit note series", &profile.credit_note_series)?;

    if !(-720..=840).contains(&profile.utc_offset_minutes) {
        return Err(ValidationError::OutOfRange {
            field: "utc offset minutes".to_string(),
            min: -720,
            max: 840,
        });
    }

    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================
