//! Example: render the listing page and every drop page to static HTML.
//!
//! Usage: cargo run -p drops --example render_site -- [--project ID] [--dataset NAME] [--out DIR]
//!
//! Project and dataset default to SANITY_PROJECT_ID / SANITY_DATASET.

use drops::{ContentClient, ContentConfig, HeaderView, ImageUrlBuilder, Site, WalletKind};
use std::path::PathBuf;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt::init();
    let args: Vec<String> = std::env::args().collect();
    let mut config = ContentConfig::from_env();
    let mut out_dir = PathBuf::from("site");
    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--project" => {
                i += 1;
                config.project_id = args.get(i).cloned().unwrap_or_default();
            }
            "--dataset" => {
                i += 1;
                if let Some(d) = args.get(i) {
                    config.dataset = d.clone();
                }
            }
            "--out" => {
                i += 1;
                if let Some(d) = args.get(i) {
                    out_dir = PathBuf::from(d);
                }
            }
            "--help" | "-h" => {
                eprintln!("Usage: render_site [--project ID] [--dataset NAME] [--out DIR]");
                std::process::exit(0);
            }
            _ => {}
        }
        i += 1;
    }
    if config.project_id.is_empty() {
        eprintln!("Usage: render_site --project ID (or set SANITY_PROJECT_ID)");
        std::process::exit(1);
    }

    let images = ImageUrlBuilder::new(config.project_id.clone(), config.dataset.clone());
    let site = Site::new(ContentClient::new(&config)?, images);
    let head = HeaderView {
        providers: WalletKind::ALL.to_vec(),
        ..Default::default()
    };

    let rt = tokio::runtime::Builder::new_current_thread().enable_all().build()?;
    rt.block_on(async {
        tokio::fs::create_dir_all(&out_dir).await?;
        let index = site.respond_or_error("/", &head).await;
        tokio::fs::write(out_dir.join("index.html"), &index.html).await?;
        tracing::info!(status = index.status.code(), "rendered /");

        let collections = site.content().list_collections().await?;
        for c in &collections {
            let path = format!("/nft/{}", c.slug.current);
            let page = site.respond_or_error(&path, &head).await;
            let dir = out_dir.join("nft").join(&c.slug.current);
            tokio::fs::create_dir_all(&dir).await?;
            tokio::fs::write(dir.join("index.html"), &page.html).await?;
            tracing::info!(%path, status = page.status.code(), "rendered");
        }

        let not_found = drops::pages::not_found_page();
        tokio::fs::write(out_dir.join("404.html"), &not_found.html).await?;
        println!("wrote {} drop pages to {}", collections.len(), out_dir.display());
        Ok::<_, Box<dyn std::error::Error>>(())
    })?;
    Ok(())
}
