//! # Seed Data Generator
//!
//! Installs the sandbox company profile, a small Peruvian catalogue and a
//! few clients, so the terminal can be tried right away.
//!
//! ## Usage
//! ```bash
//! cargo run -p cajero-db --bin seed
//! cargo run -p cajero-db --bin seed -- --db ./data/cajero.db
//! ```
//!
//! The catalogue mixes all three tax categories and several unit codes.

use std::env;

use cajero_core::{Client, CompanyProfile, IdentityDocType, Product, TaxCategory, UnitCode};
use cajero_db::{Database, DbConfig};

/// (name, category, price in céntimos, stock, tax category, unit)
const CATALOGUE: &[(&str, &str, i64, i64, TaxCategory, UnitCode)] = &[
    ("Arroz Costeño 5kg", "Abarrotes", 2450, 40, TaxCategory::Taxed, UnitCode::Niu),
    ("Azúcar Rubia a granel", "Abarrotes", 420, 120, TaxCategory::Taxed, UnitCode::Kgm),
    ("Aceite Primor 1L", "Abarrotes", 1180, 35, TaxCategory::Taxed, UnitCode::Ltr),
    ("Leche Gloria Tarro 400g", "Lácteos", 450, 96, TaxCategory::Taxed, UnitCode::Niu),
    ("Inca Kola 1.5L", "Bebidas", 650, 48, TaxCategory::Taxed, UnitCode::Niu),
    ("Agua San Luis Bidón 20L", "Bebidas", 1800, 12, TaxCategory::Taxed, UnitCode::Gll),
    ("Galletas Soda Field (caja x 6)", "Snacks", 720, 30, TaxCategory::Taxed, UnitCode::Bx),
    ("Papa Amarilla", "Verduras", 350, 200, TaxCategory::Exempt, UnitCode::Kgm),
    ("Plátano de Seda", "Frutas", 280, 150, TaxCategory::Exempt, UnitCode::Kgm),
    ("Libro Plan Lector", "Librería", 3500, 15, TaxCategory::Exempt, UnitCode::Niu),
    ("Recarga Celular", "Servicios", 1000, 999, TaxCategory::Unaffected, UnitCode::Zz),
    ("Servicio de Delivery", "Servicios", 500, 999, TaxCategory::Unaffected, UnitCode::Zz),
];

/// (document type, number, name, address)
const CLIENTS: &[(IdentityDocType, &str, &str, &str)] = &[
    (
        IdentityDocType::Ruc,
        "20100070970",
        "SUPERMERCADOS PERUANOS SOCIEDAD ANONIMA",
        "Calle Morelli 181, San Borja, Lima",
    ),
    (
        IdentityDocType::Ruc,
        "10456789012",
        "QUISPE MAMANI JUAN CARLOS",
        "Jr. Puno 320, Cercado de Lima",
    ),
    (IdentityDocType::Dni, "44556677", "Rosa Huamán Torres", "Jr. Cusco 45, Lima"),
    (IdentityDocType::ForeignerCard, "001234567", "Ana María Silva", ""),
];

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args: Vec<String> = env::args().collect();

    let mut db_path = String::from("./cajero_dev.db");

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--db" | "-d" => {
                if i + 1 < args.len() {
                    db_path = args[i + 1].clone();
                    i += 1;
                }
            }
            "--help" | "-h" => {
                println!("Cajero POS Seed Data Generator");
                println!();
                println!("Usage: seed [OPTIONS]");
                println!();
                println!("Options:");
                println!("  -d, --db <PATH>    Database file path (default: ./cajero_dev.db)");
                println!("  -h, --help         Show this help message");
                return Ok(());
            }
            _ => {}
        }
        i += 1;
    }

    println!("🌱 Cajero POS Seed Data Generator");
    println!("=================================");
    println!("Database: {}", db_path);
    println!();

    let db = Database::new(DbConfig::new(&db_path)).await?;
    println!("✓ Connected to database");
    println!("✓ Migrations applied");

    if db.company().load().await?.is_none() {
        db.company().save(&CompanyProfile::demo()).await?;
        println!("✓ Installed sandbox company profile (RUC 20123456789)");
    } else {
        println!("• Company profile already present, left untouched");
    }

    let existing = db.products().count().await?;
    if existing > 0 {
        println!("⚠ Database already has {} products", existing);
        println!("  Skipping seed to avoid duplicates.");
        println!("  Delete the database file to regenerate.");
        return Ok(());
    }

    let mut generated = 0;
    for (index, (name, category, price_cents, stock, tax_category, unit_code)) in
        CATALOGUE.iter().enumerate()
    {
        let product = Product {
            id: format!("P{:04}", index + 1),
            name: name.to_string(),
            category: category.to_string(),
            description: None,
            price_cents: *price_cents,
            stock: *stock,
            tax_category: *tax_category,
            unit_code: *unit_code,
        };

        if let Err(e) = db.products().create(&product).await {
            eprintln!("Failed to insert {}: {}", product.name, e);
            continue;
        }
        generated += 1;
    }
    println!("✓ Generated {} products", generated);

    for (doc_type, doc_number, name, address) in CLIENTS {
        let client = Client {
            id: None,
            doc_type: *doc_type,
            doc_number: doc_number.to_string(),
            name: name.to_string(),
            address: address.to_string(),
            phone: None,
            email: None,
        };
        db.clients().create(&client).await?;
    }
    println!("✓ Registered {} clients", CLIENTS.len());

    println!();
    println!("✓ Seed complete!");

    Ok(())
}
