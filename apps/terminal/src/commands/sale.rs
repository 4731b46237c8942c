//! The `sell` command: fill the cart, check out, print the outcome.

use anyhow::{anyhow, Context};
use cajero_core::money::format_amount;
use cajero_core::{AuthorityStatus, Client, Document, DocumentKind, PaymentTerm};
use clap::Args;
use tracing::debug;

use super::Terminal;
use crate::checkout::CheckoutRequest;
use crate::error::CheckoutError;

#[derive(Args, Debug)]
pub struct SellArgs {
    /// invoice, receipt or sale-note (also factura, boleta, nota-venta, or the code)
    #[arg(long, short, default_value = "receipt")]
    pub kind: DocumentKind,

    /// Document number of a registered client; walk-in customer when omitted
    #[arg(long)]
    pub client_doc: Option<String>,

    /// Line as PRODUCT_ID:QUANTITY (quantity defaults to 1); repeatable
    #[arg(long = "item", short = 'i', value_parser = parse_item, required = true)]
    pub items: Vec<(String, i64)>,

    /// Sell on credit instead of cash
    #[arg(long)]
    pub credit: bool,

    /// Confirm a receipt for a customer without identity document
    #[arg(long)]
    pub confirm_undocumented: bool,
}

/// Parses `P0001:3` or `P0001`.
pub fn parse_item(s: &str) -> Result<(String, i64), String> {
    let (id, qty) = match s.split_once(':') {
        Some((id, qty)) => {
            let qty = qty
                .trim()
                .parse::<i64>()
                .map_err(|_| format!("invalid quantity in '{s}'"))?;
            (id, qty)
        }
        None => (s, 1),
    };

    let id = id.trim();
    if id.is_empty() {
        return Err(format!("missing product id in '{s}'"));
    }
    Ok((id.to_string(), qty))
}

impl SellArgs {
    fn payment_term(&self) -> PaymentTerm {
        if self.credit {
            PaymentTerm::Credit
        } else {
            PaymentTerm::Cash
        }
    }
}

fn resolve_client(terminal: &Terminal, doc_number: Option<&str>) -> anyhow::Result<Client> {
    match doc_number {
        None => Ok(Client::anonymous()),
        Some(number) => terminal
            .clients
            .list()
            .into_iter()
            .find(|c| c.doc_number == number)
            .ok_or_else(|| anyhow!("No registered client with document {number}; use add-client first")),
    }
}

pub async fn run_sell(terminal: &Terminal, args: &SellArgs) -> anyhow::Result<Document> {
    let client = resolve_client(terminal, args.client_doc.as_deref())?;
    let products = terminal.store().list_products().await?;

    for (id, qty) in &args.items {
        let product = products
            .iter()
            .find(|p| &p.id == id)
            .ok_or_else(|| anyhow!("Unknown product {id}"))?;
        terminal
            .cart
            .with_cart_mut(|cart| cart.add_item(product, *qty))
            .with_context(|| format!("cannot add {id} to the cart"))?;
    }
    debug!(lines = args.items.len(), "Cart filled");

    let request = CheckoutRequest {
        kind: args.kind,
        client: Some(client),
        payment_term: args.payment_term(),
        confirm_undocumented: args.confirm_undocumented,
    };

    match terminal
        .orchestrator
        .checkout(&terminal.cart, &terminal.profile, request)
        .await
    {
        Ok(doc) => {
            print_outcome(&doc);
            Ok(doc)
        }
        Err(CheckoutError::PersistenceFailed { document, source }) => {
            // Last copy of a submitted document: dump it so it can be re-imported.
            let json = serde_json::to_string_pretty(&document)?;
            eprintln!("{json}");
            Err(anyhow!(
                "Document {} was issued but could not be saved: {source}",
                document.number()
            ))
        }
        Err(e) => Err(e.into()),
    }
}

fn print_outcome(doc: &Document) {
    let totals = doc.totals.rounded();
    println!("{} {}  ({})", doc.kind.label(), doc.number(), doc.payment_term.as_str());
    println!("  Client:   {} {}", doc.client.doc_number, doc.client.name);
    println!("  Subtotal: S/ {}", format_amount(totals.line_extension()));
    println!("  IGV:      S/ {}", format_amount(totals.tax_amount));
    println!("  Total:    S/ {}", format_amount(totals.grand_total));

    let status = match doc.authority.status {
        AuthorityStatus::Accepted => "ACCEPTED",
        AuthorityStatus::Rejected => "REJECTED",
        AuthorityStatus::Internal => "INTERNAL",
        AuthorityStatus::Pending => "PENDING",
    };
    println!("  Status:   {status}");
    println!("  {}", doc.authority.description);
    println!("  QR:       {}", doc.summary);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::testing;
    use cajero_core::{IdentityDocType, Product, TaxCategory, UnitCode};

    #[test]
    fn test_parse_item() {
        assert_eq!(parse_item("P0001:3"), Ok(("P0001".to_string(), 3)));
        assert_eq!(parse_item("P0002"), Ok(("P0002".to_string(), 1)));
        assert!(parse_item("P0001:x").is_err());
        assert!(parse_item(":2").is_err());
    }

    async fn stocked_terminal(accept: bool) -> Terminal {
        let terminal = testing::terminal(accept).await;
        terminal
            .store()
            .create_product(&Product {
                id: "P0001".to_string(),
                name: "Aceite Primor 1L".to_string(),
                category: "Abarrotes".to_string(),
                description: None,
                price_cents: 1180,
                stock: 20,
                tax_category: TaxCategory::Taxed,
                unit_code: UnitCode::Niu,
            })
            .await
            .unwrap();
        terminal
    }

    fn sell_args(kind: DocumentKind, client_doc: Option<&str>) -> SellArgs {
        SellArgs {
            kind,
            client_doc: client_doc.map(str::to_string),
            items: vec![("P0001".to_string(), 10)],
            credit: false,
            confirm_undocumented: false,
        }
    }

    #[tokio::test]
    async fn test_sell_invoice_to_registered_client() {
        let terminal = stocked_terminal(true).await;
        terminal
            .clients
            .register(
                terminal.store(),
                Client {
                    id: None,
                    doc_type: IdentityDocType::Ruc,
                    doc_number: "20100070970".to_string(),
                    name: "SUPERMERCADOS PERUANOS S.A.".to_string(),
                    address: String::new(),
                    phone: None,
                    email: None,
                },
            )
            .await
            .unwrap();

        let doc = run_sell(&terminal, &sell_args(DocumentKind::Invoice, Some("20100070970")))
            .await
            .unwrap();

        assert_eq!(doc.number(), "F001-00000001");
        assert_eq!(format_amount(doc.totals.grand_total), "118.00");
        assert_eq!(doc.authority.status, AuthorityStatus::Accepted);
        assert!(terminal.cart.with_cart(|c| c.is_empty()));
    }

    #[tokio::test]
    async fn test_sell_unknown_client_or_product() {
        let terminal = stocked_terminal(true).await;
        assert!(run_sell(&terminal, &sell_args(DocumentKind::Invoice, Some("20999999999")))
            .await
            .is_err());

        let args = SellArgs {
            items: vec![("NOPE".to_string(), 1)],
            ..sell_args(DocumentKind::SaleNote, None)
        };
        assert!(run_sell(&terminal, &args).await.is_err());
    }

    #[tokio::test]
    async fn test_walk_in_sale_note() {
        let terminal = stocked_terminal(false).await;
        let doc = run_sell(&terminal, &sell_args(DocumentKind::SaleNote, None))
            .await
            .unwrap();
        assert_eq!(doc.number(), "NV01-00000001");
        assert_eq!(doc.authority.status, AuthorityStatus::Internal);
    }
}
