//! Catalogue and client directory commands.

use anyhow::{bail, Context};
use cajero_core::validation::{validate_client, validate_product};
use cajero_core::{Client, IdentityDocType, Money, Product, TaxCategory, UnitCode};
use clap::Args;
use tracing::{info, warn};

use super::Terminal;
use crate::integrations::{HttpIdentityLookup, IdentityLookup, IdentityRecord};

pub async fn run_products(terminal: &Terminal) -> anyhow::Result<()> {
    let products = terminal.store().list_products().await?;
    if products.is_empty() {
        println!("No products. Add one with `cajero add-product` or run the seed binary.");
        return Ok(());
    }

    println!("{:<8} {:<32} {:<12} {:>10} {:>6} {:<4}", "ID", "NAME", "CATEGORY", "PRICE", "STOCK", "TAX");
    for p in products {
        println!(
            "{:<8} {:<32} {:<12} {:>10} {:>6} {:<4}",
            p.id,
            p.name,
            p.category,
            format!("S/ {}", Money::from_cents(p.price_cents)),
            p.stock,
            p.tax_category.scheme_name()
        );
    }
    Ok(())
}

pub async fn run_clients(terminal: &Terminal) -> anyhow::Result<()> {
    let clients = terminal.clients.list();
    println!("{:<6} {:<12} {:<40} {:<12}", "DOC", "NUMBER", "NAME", "PHONE");
    for c in clients {
        println!(
            "{:<6} {:<12} {:<40} {:<12}",
            c.doc_type.label(),
            c.doc_number,
            c.name,
            c.phone.as_deref().unwrap_or("-")
        );
    }
    Ok(())
}

#[derive(Args, Debug)]
pub struct AddProductArgs {
    pub name: String,

    /// Final price including IGV when taxed, e.g. 11.80
    #[arg(long, value_parser = parse_price)]
    pub price: Money,

    #[arg(long, default_value = "General")]
    pub category: String,

    #[arg(long, default_value_t = 0)]
    pub stock: i64,

    /// taxed (gravado), exempt (exonerado) or unaffected (inafecto)
    #[arg(long, default_value = "taxed")]
    pub tax: TaxCategory,

    /// NIU, ZZ, KGM, LTR, BX or GLL
    #[arg(long, default_value = "NIU")]
    pub unit: UnitCode,

    #[arg(long)]
    pub description: Option<String>,

    /// Product code; the next free `P0000` code when omitted
    #[arg(long)]
    pub id: Option<String>,
}

pub fn parse_price(text: &str) -> Result<Money, String> {
    Money::parse_decimal(text).ok_or_else(|| format!("invalid price '{text}', expected e.g. 11.80"))
}

/// `P0001`, `P0002`, ... skipping codes already taken.
fn next_product_id(products: &[Product]) -> String {
    let mut n = products.len() + 1;
    loop {
        let id = format!("P{n:04}");
        if !products.iter().any(|p| p.id == id) {
            return id;
        }
        n += 1;
    }
}

pub async fn run_add_product(terminal: &Terminal, args: AddProductArgs) -> anyhow::Result<Product> {
    let store = terminal.store();
    let id = match args.id.map(|id| id.trim().to_ascii_uppercase()) {
        Some(id) if !id.is_empty() => id,
        _ => next_product_id(&store.list_products().await?),
    };

    let product = Product {
        id,
        name: args.name.trim().to_string(),
        category: args.category.trim().to_string(),
        description: args.description.filter(|d| !d.trim().is_empty()),
        price_cents: args.price.cents(),
        stock: args.stock,
        tax_category: args.tax,
        unit_code: args.unit,
    };
    validate_product(&product)?;

    let stored = store
        .create_product(&product)
        .await
        .context("could not save product")?;
    info!(id = %stored.id, price = %stored.price(), "Product added");
    println!(
        "Product saved: {} {} S/ {} ({})",
        stored.id,
        stored.name,
        stored.price(),
        stored.tax_category.scheme_name()
    );
    Ok(stored)
}

#[derive(Args, Debug)]
pub struct LookupArgs {
    /// DNI or RUC
    pub doc_type: IdentityDocType,
    pub number: String,
}

fn identity_lookup(terminal: &Terminal) -> anyhow::Result<HttpIdentityLookup> {
    Ok(HttpIdentityLookup::new(
        &terminal.config.integrations,
        terminal.profile.lookup_token.clone(),
    )?)
}

pub async fn run_lookup(terminal: &Terminal, args: &LookupArgs) -> anyhow::Result<()> {
    let lookup = identity_lookup(terminal)?;
    match lookup
        .lookup(args.doc_type, &args.number)
        .await
        .context("identity lookup failed")?
    {
        Some(record) => print_record(&record),
        None => println!("{} {} not found", args.doc_type.label(), args.number),
    }
    Ok(())
}

fn print_record(record: &IdentityRecord) {
    println!("{} {}", record.doc_type.label(), record.doc_number);
    println!("  Name:    {}", record.name);
    if !record.address.is_empty() {
        println!("  Address: {}", record.address);
    }
}

#[derive(Args, Debug)]
pub struct AddClientArgs {
    /// DNI, RUC, CE, PASAPORTE or -
    pub doc_type: IdentityDocType,
    pub doc_number: String,

    /// Name; looked up by document number when omitted
    #[arg(long)]
    pub name: Option<String>,

    #[arg(long, default_value = "")]
    pub address: String,

    #[arg(long)]
    pub phone: Option<String>,

    #[arg(long)]
    pub email: Option<String>,
}

impl AddClientArgs {
    fn into_client(self, found: Option<IdentityRecord>) -> Option<Client> {
        let (name, address) = match (self.name, found) {
            (Some(name), found) => {
                let address = if self.address.is_empty() {
                    found.map(|r| r.address).unwrap_or_default()
                } else {
                    self.address
                };
                (name, address)
            }
            (None, Some(record)) if self.address.is_empty() => (record.name, record.address),
            (None, Some(record)) => (record.name, self.address),
            (None, None) => return None,
        };

        Some(Client {
            id: None,
            doc_type: self.doc_type,
            doc_number: self.doc_number,
            name,
            address,
            phone: self.phone,
            email: self.email,
        })
    }
}

pub async fn run_add_client(terminal: &Terminal, args: AddClientArgs) -> anyhow::Result<()> {
    if let Some(existing) = terminal
        .clients
        .find_by_document(args.doc_type, &args.doc_number)
    {
        println!("Client already registered: {}", existing.name);
        return Ok(());
    }

    let found = if args.name.is_none()
        && matches!(args.doc_type, IdentityDocType::Dni | IdentityDocType::Ruc)
    {
        match identity_lookup(terminal)?
            .lookup(args.doc_type, &args.doc_number)
            .await
        {
            Ok(found) => found,
            Err(e) => {
                warn!(error = %e, "Identity lookup unavailable, manual entry required");
                None
            }
        }
    } else {
        None
    };

    let Some(client) = args.into_client(found) else {
        bail!("Name not found for this document; pass --name to enter it manually");
    };
    validate_client(&client)?;

    let stored = terminal
        .clients
        .register(terminal.store(), client)
        .await
        .context("could not save client")?;
    println!(
        "Client saved: {} {} {}",
        stored.doc_type.label(),
        stored.doc_number,
        stored.name
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::testing;

    fn args(name: Option<&str>, address: &str) -> AddClientArgs {
        AddClientArgs {
            doc_type: IdentityDocType::Ruc,
            doc_number: "20100070970".to_string(),
            name: name.map(str::to_string),
            address: address.to_string(),
            phone: None,
            email: None,
        }
    }

    fn record() -> IdentityRecord {
        IdentityRecord {
            doc_type: IdentityDocType::Ruc,
            doc_number: "20100070970".to_string(),
            name: "SUPERMERCADOS PERUANOS S.A.".to_string(),
            address: "AV. MORONE 113".to_string(),
        }
    }

    #[test]
    fn test_manual_name_wins_over_lookup() {
        let client = args(Some("ACME"), "").into_client(Some(record())).unwrap();
        assert_eq!(client.name, "ACME");
        assert_eq!(client.address, "AV. MORONE 113");

        let client = args(None, "JR. UNO 1").into_client(Some(record())).unwrap();
        assert_eq!(client.name, "SUPERMERCADOS PERUANOS S.A.");
        assert_eq!(client.address, "JR. UNO 1");

        assert!(args(None, "").into_client(None).is_none());
    }

    #[tokio::test]
    async fn test_add_client_with_manual_name() {
        let terminal = testing::terminal(true).await;
        run_add_client(&terminal, args(Some("ACME S.A.C."), "AV. LIMA 1"))
            .await
            .unwrap();

        let stored = terminal
            .clients
            .find_by_document(IdentityDocType::Ruc, "20100070970")
            .unwrap();
        assert!(stored.id.is_some());
        assert_eq!(terminal.store().list_clients().await.unwrap(), vec![stored]);
    }

    fn product_args(name: &str, price: &str) -> AddProductArgs {
        AddProductArgs {
            name: name.to_string(),
            price: parse_price(price).unwrap(),
            category: "Abarrotes".to_string(),
            stock: 10,
            tax: TaxCategory::Taxed,
            unit: UnitCode::Niu,
            description: None,
            id: None,
        }
    }

    #[test]
    fn test_parse_price() {
        assert_eq!(parse_price("11.80"), Ok(Money::from_cents(1180)));
        assert!(parse_price("11.805").is_err());
        assert!(parse_price("once").is_err());
    }

    #[tokio::test]
    async fn test_add_product_assigns_next_code() {
        let terminal = testing::terminal(true).await;
        let first = run_add_product(&terminal, product_args("Azúcar Rubia 1kg", "4.20"))
            .await
            .unwrap();
        let second = run_add_product(&terminal, product_args("Aceite Primor 1L", "11.80"))
            .await
            .unwrap();

        assert_eq!(first.id, "P0001");
        assert_eq!(second.id, "P0002");
        assert_eq!(second.price_cents, 1180);
        assert_eq!(terminal.store().list_products().await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_add_product_rejects_duplicates_and_bad_input() {
        let terminal = testing::terminal(true).await;
        let mut args = product_args("Arroz", "3.50");
        args.id = Some("p0007".to_string());
        assert_eq!(run_add_product(&terminal, args).await.unwrap().id, "P0007");

        let mut args = product_args("Otro arroz", "3.50");
        args.id = Some("P0007".to_string());
        assert!(run_add_product(&terminal, args).await.is_err());

        let mut args = product_args("Arroz", "3.50");
        args.stock = -5;
        assert!(run_add_product(&terminal, args).await.is_err());
        assert_eq!(terminal.store().list_products().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_add_client_without_name_or_token_fails() {
        let terminal = testing::terminal(true).await;
        assert!(run_add_client(&terminal, args(None, "")).await.is_err());
        assert!(terminal.clients.is_empty());
    }
}
