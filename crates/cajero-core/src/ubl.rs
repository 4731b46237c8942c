//! # UBL 2.1 Serializer
//!
//! Renders invoices and receipts as UBL 2.1 `Invoice` XML in the layout the
//! tax authority expects.
//!
//! ## Document Layout
//! ```text
//! <?xml ... encoding="ISO-8859-1"?>
//! <Invoice xmlns=...>
//!   ext:UBLExtensions        placeholder ds:Signature (DigestValue, SignatureValue)
//!   UBLVersionID 2.1 / CustomizationID 2.0
//!   ID                       F001-00000012
//!   IssueDate / IssueTime    issuer-local
//!   InvoiceTypeCode          01 | 03   (listID="0101")
//!   DocumentCurrencyCode     PEN
//!   cac:Signature            issuer reference
//!   AccountingSupplierParty  RUC, legal name, ubigeo
//!   AccountingCustomerParty  catalogue-06 scheme, number, name
//!   PaymentTerms             FormaPago, Contado | Credito (+ Amount on credit)
//!   TaxTotal                 one TaxSubtotal per non-zero base
//!   LegalMonetaryTotal
//!   InvoiceLine × n          each line re-derives its own base and tax
//! </Invoice>
//! ```
//!
//! Rendering is a pure function of the document and the issuer: the
//! signature block holds SHA-256 stand-ins derived from the content, so the
//! same document always renders to the same bytes.

use std::io;

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use quick_xml::events::{BytesCData, BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::Writer;
use rust_decimal::Decimal;
use sha2::{Digest, Sha256};

use crate::error::{CoreError, CoreResult};
use crate::money::format_amount;
use crate::tax::apportion;
use crate::types::{
    CompanyProfile, Document, DocumentKind, LineItem, PaymentTerm, TaxCategory, TAX_TYPE_CODE,
};

/// Document currency (soles).
pub const CURRENCY: &str = "PEN";

const NAMESPACES: &[(&str, &str)] = &[
    ("xmlns", "urn:oasis:names:specification:ubl:schema:xsd:Invoice-2"),
    ("xmlns:cac", "urn:oasis:names:specification:ubl:schema:xsd:CommonAggregateComponents-2"),
    ("xmlns:cbc", "urn:oasis:names:specification:ubl:schema:xsd:CommonBasicComponents-2"),
    ("xmlns:ccts", "urn:un:unece:uncefact:documentation:2"),
    ("xmlns:ds", "http://www.w3.org/2000/09/xmldsig#"),
    ("xmlns:ext", "urn:oasis:names:specification:ubl:schema:xsd:CommonExtensionComponents-2"),
    ("xmlns:qdt", "urn:oasis:names:specification:ubl:schema:xsd:QualifiedDatatypes-2"),
    ("xmlns:udt", "urn:un:unece:uncefact:data:specification:UnqualifiedDataTypesSchemaModule:2"),
    ("xmlns:xsi", "http://www.w3.org/2001/XMLSchema-instance"),
];

const SIGNATURE_ID: &str = "SignSUNAT";

// =============================================================================
// Public API
// =============================================================================

/// Renders `doc` as UBL 2.1 XML.
///
/// Only invoices and receipts can be rendered; sale notes never reach the
/// authority and credit notes need a referenced document.
pub fn render(doc: &Document, issuer: &CompanyProfile) -> CoreResult<String> {
    match doc.kind {
        DocumentKind::Invoice | DocumentKind::Receipt => {}
        kind => {
            return Err(CoreError::UnsupportedKind {
                kind,
                operation: "UBL rendering",
            })
        }
    }

    let mut w = XmlWriter::new();
    w.declaration()?;
    w.open_with("Invoice", NAMESPACES)?;
    write_signature_extension(&mut w, doc, issuer)?;
    write_header(&mut w, doc)?;
    write_issuer_signature(&mut w, issuer)?;
    write_supplier(&mut w, issuer)?;
    write_customer(&mut w, doc)?;
    write_payment_terms(&mut w, doc)?;
    write_tax_total(&mut w, doc)?;
    write_monetary_total(&mut w, doc)?;
    for (index, line) in doc.items.iter().enumerate() {
        write_line(&mut w, index + 1, line)?;
    }
    w.close("Invoice")?;

    w.finish()
}

/// Deterministic stand-in for the `ds:DigestValue` of a document.
///
/// Base64 SHA-256 over the fiscal content. Not a real XML-DSig digest.
pub fn placeholder_digest(doc: &Document, issuer: &CompanyProfile) -> String {
    let totals = doc.totals.rounded();
    let mut hasher = Sha256::new();
    hasher.update(issuer.ruc.as_bytes());
    hasher.update(b"|");
    hasher.update(doc.kind.code().as_bytes());
    hasher.update(b"|");
    hasher.update(doc.number().as_bytes());
    hasher.update(b"|");
    hasher.update(doc.issued_at.to_rfc3339().as_bytes());
    hasher.update(b"|");
    hasher.update(doc.client.doc_type.code().as_bytes());
    hasher.update(doc.client.doc_number.as_bytes());
    hasher.update(b"|");
    hasher.update(doc.payment_term.as_str().as_bytes());
    hasher.update(b"|");
    hasher.update(format_amount(totals.tax_amount).as_bytes());
    hasher.update(format_amount(totals.grand_total).as_bytes());
    for line in &doc.items {
        hasher.update(b"|");
        hasher.update(line.product_id.as_bytes());
        hasher.update(line.quantity.to_string().as_bytes());
        hasher.update(line.unit_price.to_string().as_bytes());
        hasher.update(line.tax_category.code().as_bytes());
    }
    STANDARD.encode(hasher.finalize())
}

/// Reads the first `ds:DigestValue` out of rendered XML.
pub fn extract_digest(xml: &str) -> Option<&str> {
    const OPEN: &str = "<ds:DigestValue>";
    const CLOSE: &str = "</ds:DigestValue>";

    let start = xml.find(OPEN)? + OPEN.len();
    let len = xml[start..].find(CLOSE)?;
    let value = xml[start..start + len].trim();
    (!value.is_empty()).then_some(value)
}

fn placeholder_signature(digest: &str, issuer: &CompanyProfile) -> String {
    let first = Sha256::new()
        .chain_update(digest.as_bytes())
        .chain_update(issuer.ruc.as_bytes())
        .finalize();
    let second = Sha256::new()
        .chain_update(first)
        .chain_update(SIGNATURE_ID.as_bytes())
        .finalize();

    let mut bytes = Vec::with_capacity(64);
    bytes.extend_from_slice(&first);
    bytes.extend_from_slice(&second);
    STANDARD.encode(bytes)
}

// =============================================================================
// Sections
// =============================================================================

fn write_signature_extension(
    w: &mut XmlWriter,
    doc: &Document,
    issuer: &CompanyProfile,
) -> io::Result<()> {
    let digest = placeholder_digest(doc, issuer);
    let signature = placeholder_signature(&digest, issuer);

    w.open("ext:UBLExtensions")?;
    w.open("ext:UBLExtension")?;
    w.open("ext:ExtensionContent")?;
    w.open_with("ds:Signature", &[("Id", SIGNATURE_ID)])?;
    w.open("ds:SignedInfo")?;
    w.empty(
        "ds:CanonicalizationMethod",
        &[("Algorithm", "http://www.w3.org/TR/2001/REC-xml-c14n-20010315")],
    )?;
    w.empty(
        "ds:SignatureMethod",
        &[("Algorithm", "http://www.w3.org/2000/09/xmldsig#rsa-sha1")],
    )?;
    w.open_with("ds:Reference", &[("URI", "")])?;
    w.open("ds:Transforms")?;
    w.empty(
        "ds:Transform",
        &[("Algorithm", "http://www.w3.org/2000/09/xmldsig#enveloped-signature")],
    )?;
    w.close("ds:Transforms")?;
    w.empty(
        "ds:DigestMethod",
        &[("Algorithm", "http://www.w3.org/2000/09/xmldsig#sha1")],
    )?;
    w.leaf("ds:DigestValue", &digest)?;
    w.close("ds:Reference")?;
    w.close("ds:SignedInfo")?;
    w.leaf("ds:SignatureValue", &signature)?;
    w.close("ds:Signature")?;
    w.close("ext:ExtensionContent")?;
    w.close("ext:UBLExtension")?;
    w.close("ext:UBLExtensions")
}

fn write_header(w: &mut XmlWriter, doc: &Document) -> io::Result<()> {
    w.leaf("cbc:UBLVersionID", "2.1")?;
    w.leaf("cbc:CustomizationID", "2.0")?;
    w.leaf("cbc:ID", &doc.number())?;
    w.leaf("cbc:IssueDate", &doc.issue_date())?;
    w.leaf("cbc:IssueTime", &doc.issue_time())?;
    w.leaf_with("cbc:InvoiceTypeCode", &[("listID", "0101")], doc.kind.code())?;
    w.leaf("cbc:DocumentCurrencyCode", CURRENCY)
}

fn write_issuer_signature(w: &mut XmlWriter, issuer: &CompanyProfile) -> io::Result<()> {
    w.comment("Emisor")?;
    w.open("cac:Signature")?;
    w.leaf("cbc:ID", &issuer.ruc)?;
    w.open("cac:SignatoryParty")?;
    w.open("cac:PartyIdentification")?;
    w.leaf("cbc:ID", &issuer.ruc)?;
    w.close("cac:PartyIdentification")?;
    w.open("cac:PartyName")?;
    w.cdata("cbc:Name", &issuer.legal_name)?;
    w.close("cac:PartyName")?;
    w.close("cac:SignatoryParty")?;
    w.open("cac:DigitalSignatureAttachment")?;
    w.open("cac:ExternalReference")?;
    w.leaf("cbc:URI", &format!("#{}", SIGNATURE_ID))?;
    w.close("cac:ExternalReference")?;
    w.close("cac:DigitalSignatureAttachment")?;
    w.close("cac:Signature")
}

fn write_supplier(w: &mut XmlWriter, issuer: &CompanyProfile) -> io::Result<()> {
    w.open("cac:AccountingSupplierParty")?;
    w.open("cac:Party")?;
    w.open("cac:PartyIdentification")?;
    w.leaf_with("cbc:ID", &[("schemeID", "6")], &issuer.ruc)?;
    w.close("cac:PartyIdentification")?;
    w.open("cac:PartyName")?;
    w.cdata("cbc:Name", &issuer.legal_name)?;
    w.close("cac:PartyName")?;
    w.open("cac:PartyLegalEntity")?;
    w.cdata("cbc:RegistrationName", &issuer.legal_name)?;
    w.open("cac:RegistrationAddress")?;
    w.leaf("cbc:ID", &issuer.ubigeo)?;
    w.leaf("cbc:AddressTypeCode", "0000")?;
    w.close("cac:RegistrationAddress")?;
    w.close("cac:PartyLegalEntity")?;
    w.close("cac:Party")?;
    w.close("cac:AccountingSupplierParty")
}

fn write_customer(w: &mut XmlWriter, doc: &Document) -> io::Result<()> {
    w.comment("Cliente")?;
    w.open("cac:AccountingCustomerParty")?;
    w.open("cac:Party")?;
    w.open("cac:PartyIdentification")?;
    w.leaf_with(
        "cbc:ID",
        &[("schemeID", doc.client.doc_type.code())],
        &doc.client.doc_number,
    )?;
    w.close("cac:PartyIdentification")?;
    w.open("cac:PartyLegalEntity")?;
    w.cdata("cbc:RegistrationName", &doc.client.name)?;
    w.close("cac:PartyLegalEntity")?;
    w.close("cac:Party")?;
    w.close("cac:AccountingCustomerParty")
}

fn write_payment_terms(w: &mut XmlWriter, doc: &Document) -> io::Result<()> {
    w.open("cac:PaymentTerms")?;
    w.leaf("cbc:ID", "FormaPago")?;
    w.leaf("cbc:PaymentMeansID", doc.payment_term.as_str())?;
    if doc.payment_term == PaymentTerm::Credit {
        w.amount("cbc:Amount", doc.totals.grand_total)?;
    }
    w.close("cac:PaymentTerms")
}

fn write_tax_total(w: &mut XmlWriter, doc: &Document) -> io::Result<()> {
    let totals = &doc.totals;
    w.comment("Totales Globales")?;
    w.open("cac:TaxTotal")?;
    w.amount("cbc:TaxAmount", totals.tax_amount)?;

    let subtotals = [
        (TaxCategory::Taxed, totals.taxed_base, totals.tax_amount),
        (TaxCategory::Exempt, totals.exempt_base, Decimal::ZERO),
        (TaxCategory::Unaffected, totals.unaffected_base, Decimal::ZERO),
    ];
    for (category, base, tax) in subtotals {
        if base.is_zero() {
            continue;
        }
        w.open("cac:TaxSubtotal")?;
        w.amount("cbc:TaxableAmount", base)?;
        w.amount("cbc:TaxAmount", tax)?;
        w.open("cac:TaxCategory")?;
        write_tax_scheme(w, category)?;
        w.close("cac:TaxCategory")?;
        w.close("cac:TaxSubtotal")?;
    }

    w.close("cac:TaxTotal")
}

fn write_monetary_total(w: &mut XmlWriter, doc: &Document) -> io::Result<()> {
    let totals = &doc.totals;
    w.open("cac:LegalMonetaryTotal")?;
    w.amount("cbc:LineExtensionAmount", totals.line_extension())?;
    w.amount("cbc:TaxInclusiveAmount", totals.grand_total)?;
    w.amount("cbc:PayableAmount", totals.grand_total)?;
    w.close("cac:LegalMonetaryTotal")
}

fn write_line(w: &mut XmlWriter, index: usize, line: &LineItem) -> io::Result<()> {
    let category = line.tax_category;
    // Each line is apportioned on its own; the document totals are not split.
    let (base, tax) = apportion(line.line_total(), category);
    let (unit_base, _) = apportion(line.unit_price, category);

    w.open("cac:InvoiceLine")?;
    w.leaf("cbc:ID", &index.to_string())?;
    w.leaf_with(
        "cbc:InvoicedQuantity",
        &[("unitCode", line.unit_code.code())],
        &line.quantity.to_string(),
    )?;
    w.amount("cbc:LineExtensionAmount", base)?;
    w.open("cac:PricingReference")?;
    w.open("cac:AlternativeConditionPrice")?;
    w.amount("cbc:PriceAmount", line.unit_price.to_decimal())?;
    w.leaf("cbc:PriceTypeCode", "01")?;
    w.close("cac:AlternativeConditionPrice")?;
    w.close("cac:PricingReference")?;
    w.open("cac:TaxTotal")?;
    w.amount("cbc:TaxAmount", tax)?;
    w.open("cac:TaxSubtotal")?;
    w.amount("cbc:TaxableAmount", base)?;
    w.amount("cbc:TaxAmount", tax)?;
    w.open("cac:TaxCategory")?;
    w.leaf("cbc:Percent", category.percent())?;
    w.leaf("cbc:TaxExemptionReasonCode", category.code())?;
    write_tax_scheme(w, category)?;
    w.close("cac:TaxCategory")?;
    w.close("cac:TaxSubtotal")?;
    w.close("cac:TaxTotal")?;
    w.open("cac:Item")?;
    w.cdata("cbc:Description", &line.description)?;
    w.close("cac:Item")?;
    w.open("cac:Price")?;
    w.amount("cbc:PriceAmount", unit_base)?;
    w.close("cac:Price")?;
    w.close("cac:InvoiceLine")
}

fn write_tax_scheme(w: &mut XmlWriter, category: TaxCategory) -> io::Result<()> {
    w.open("cac:TaxScheme")?;
    w.leaf("cbc:ID", category.scheme_id())?;
    w.leaf("cbc:Name", category.scheme_name())?;
    w.leaf("cbc:TaxTypeCode", TAX_TYPE_CODE)?;
    w.close("cac:TaxScheme")
}

// =============================================================================
// XML Writer
// =============================================================================

/// Indenting UBL writer over `quick_xml`; four spaces per level.
///
/// Text and attribute values are escaped by `quick_xml`; free text that
/// the authority shows verbatim (names, descriptions) goes in CDATA.
struct XmlWriter {
    inner: Writer<Vec<u8>>,
}

impl XmlWriter {
    fn new() -> Self {
        XmlWriter {
            inner: Writer::new_with_indent(Vec::new(), b' ', 4),
        }
    }

    fn declaration(&mut self) -> io::Result<()> {
        self.inner
            .write_event(Event::Decl(BytesDecl::new("1.0", Some("ISO-8859-1"), Some("no"))))
    }

    fn open(&mut self, tag: &str) -> io::Result<()> {
        self.open_with(tag, &[])
    }

    fn open_with(&mut self, tag: &str, attrs: &[(&str, &str)]) -> io::Result<()> {
        let start = BytesStart::new(tag).with_attributes(attrs.iter().copied());
        self.inner.write_event(Event::Start(start))
    }

    fn close(&mut self, tag: &str) -> io::Result<()> {
        self.inner.write_event(Event::End(BytesEnd::new(tag)))
    }

    fn empty(&mut self, tag: &str, attrs: &[(&str, &str)]) -> io::Result<()> {
        let start = BytesStart::new(tag).with_attributes(attrs.iter().copied());
        self.inner.write_event(Event::Empty(start))
    }

    fn leaf(&mut self, tag: &str, text: &str) -> io::Result<()> {
        self.leaf_with(tag, &[], text)
    }

    fn leaf_with(&mut self, tag: &str, attrs: &[(&str, &str)], text: &str) -> io::Result<()> {
        self.open_with(tag, attrs)?;
        self.inner.write_event(Event::Text(BytesText::new(text)))?;
        self.close(tag)
    }

    fn cdata(&mut self, tag: &str, text: &str) -> io::Result<()> {
        self.open(tag)?;
        // "]]>" cannot appear inside one CDATA section; split it across two
        let mut rest = text;
        while let Some(pos) = rest.find("]]>") {
            let (head, tail) = rest.split_at(pos + 2);
            self.inner.write_event(Event::CData(BytesCData::new(head)))?;
            rest = tail;
        }
        self.inner.write_event(Event::CData(BytesCData::new(rest)))?;
        self.close(tag)
    }

    fn amount(&mut self, tag: &str, value: Decimal) -> io::Result<()> {
        self.leaf_with(tag, &[("currencyID", CURRENCY)], &format_amount(value))
    }

    fn comment(&mut self, text: &str) -> io::Result<()> {
        let padded = format!(" {} ", text);
        self.inner
            .write_event(Event::Comment(BytesText::from_escaped(padded.as_str())))
    }

    fn finish(self) -> CoreResult<String> {
        String::from_utf8(self.inner.into_inner())
            .map_err(|err| CoreError::Render(io::Error::new(io::ErrorKind::InvalidData, err)))
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
