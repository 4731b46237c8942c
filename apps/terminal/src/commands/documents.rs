//! Issued document commands: history, show, render, send.

use anyhow::{anyhow, bail};
use cajero_core::money::format_amount;
use cajero_core::{ubl, Document, DocumentKind};
use clap::Args;

use super::Terminal;
use crate::integrations::{deliver_document, Delivery, HttpMessageDispatcher};

#[derive(Args, Debug)]
pub struct HistoryArgs {
    /// Only documents of this kind
    #[arg(long, short)]
    pub kind: Option<DocumentKind>,

    #[arg(long, default_value_t = 50)]
    pub limit: usize,
}

pub async fn run_history(terminal: &Terminal, args: &HistoryArgs) -> anyhow::Result<()> {
    let store = terminal.store();
    let documents = match args.kind {
        Some(kind) => store.documents_of_kind(kind).await?,
        None => store.list_documents().await?,
    };

    println!(
        "{:<15} {:<14} {:<20} {:<32} {:>10} {:<9}",
        "NUMBER", "KIND", "ISSUED", "CLIENT", "TOTAL", "STATUS"
    );
    for doc in documents.iter().take(args.limit) {
        println!(
            "{:<15} {:<14} {:<20} {:<32} {:>10} {:<9}",
            doc.number(),
            doc.kind.label(),
            format!("{} {}", doc.issue_date(), doc.issue_time()),
            doc.client.name,
            format_amount(doc.totals.grand_total),
            format!("{:?}", doc.authority.status)
        );
    }
    Ok(())
}

/// `SERIES CORRELATIVE`, e.g. `B001 42`.
#[derive(Args, Debug)]
pub struct DocumentRef {
    pub series: String,
    pub correlative: u32,
}

async fn find(terminal: &Terminal, doc_ref: &DocumentRef) -> anyhow::Result<Document> {
    terminal
        .store()
        .find_document(&doc_ref.series.to_ascii_uppercase(), doc_ref.correlative)
        .await?
        .ok_or_else(|| anyhow!("Document {}-{} not found", doc_ref.series, doc_ref.correlative))
}

pub async fn run_show(terminal: &Terminal, doc_ref: &DocumentRef) -> anyhow::Result<()> {
    let doc = find(terminal, doc_ref).await?;
    let totals = doc.totals.rounded();

    println!("{} {}", doc.kind.label(), doc.number());
    println!("Issued:   {} {}", doc.issue_date(), doc.issue_time());
    println!(
        "Client:   {} {} {}",
        doc.client.doc_type.label(),
        doc.client.doc_number,
        doc.client.name
    );
    println!("Payment:  {}", doc.payment_term.as_str());
    println!();
    for item in &doc.items {
        println!(
            "  {:>4} x {:<32} {:>10}",
            item.quantity,
            item.description,
            item.line_total()
        );
    }
    println!();
    println!("Taxed:      {:>10}", format_amount(totals.taxed_base));
    println!("Exempt:     {:>10}", format_amount(totals.exempt_base));
    println!("Unaffected: {:>10}", format_amount(totals.unaffected_base));
    println!("IGV:        {:>10}", format_amount(totals.tax_amount));
    println!("Total:      {:>10}", format_amount(totals.grand_total));
    println!();
    println!("Status:   {:?}", doc.authority.status);
    println!("Response: {}", doc.authority.description);
    if let Some(cdr) = &doc.authority.cdr_reference {
        println!("CDR:      {cdr}");
    }
    println!("QR:       {}", doc.summary);
    Ok(())
}

/// Prints the UBL document; the stored signed XML if there is one.
pub async fn run_render(terminal: &Terminal, doc_ref: &DocumentRef) -> anyhow::Result<()> {
    let doc = find(terminal, doc_ref).await?;
    match doc.authority.signed_xml.as_deref().filter(|xml| !xml.is_empty()) {
        Some(xml) => println!("{xml}"),
        None => println!("{}", ubl::render(&doc, &terminal.profile)?),
    }
    Ok(())
}

#[derive(Args, Debug)]
pub struct SendArgs {
    #[command(flatten)]
    pub document: DocumentRef,

    /// Recipient phone; defaults to the client's phone
    #[arg(long)]
    pub phone: Option<String>,
}

pub async fn run_send(terminal: &Terminal, args: &SendArgs) -> anyhow::Result<()> {
    let doc = find(terminal, &args.document).await?;
    let Some(phone) = args.phone.clone().or_else(|| doc.client.phone.clone()) else {
        bail!("No phone for {}; pass --phone", doc.client.name);
    };

    let dispatcher = HttpMessageDispatcher::new(&terminal.config.integrations)?;
    match deliver_document(&dispatcher, &doc, &terminal.profile, &phone).await? {
        Delivery::Sent => println!("Sent {} to {phone}", doc.number()),
        Delivery::Fallback(link) => {
            println!("Could not send automatically. Open this link to send it by hand:");
            println!("{link}");
        }
    }
    Ok(())
}
