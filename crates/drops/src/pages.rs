//! Pages and routes.
//!
//! - `/` lists every collection.
//! - `/nft/<slug>` shows one drop; an unknown slug is a not-found page.
//!
//! Content fetch failures become the generic error page via [Site::respond_or_error].

use crate::components::{collection_card, escape, header, mint_panel, HeaderView};
use crate::content::{Collection, CollectionSummary, ContentClient, ContentError};
use crate::image::{Fit, ImageUrlBuilder};
use crate::mint::MintState;
use thiserror::Error;

const SITE_TITLE: &str = "Home | Simply Drops";
const SITE_DESCRIPTION: &str = "Your #1 spot for exclusive NFT Drops!";

#[derive(Debug, Error)]
pub enum SiteError {
    #[error("content fetch failed: {0}")]
    Content(#[from] ContentError),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Route {
    Listing,
    Drop(String),
}

impl Route {
    /// Parses a request path (query string and trailing slash ignored).
    pub fn parse(path: &str) -> Option<Route> {
        let path = path.split(['?', '#']).next().unwrap_or("");
        let path = path.trim_end_matches('/');
        if path.is_empty() {
            return Some(Route::Listing);
        }
        let slug = path.strip_prefix("/nft/")?;
        if slug.is_empty() || slug.contains('/') {
            return None;
        }
        Some(Route::Drop(slug.to_string()))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageStatus {
    Ok,
    NotFound,
    Error,
}

impl PageStatus {
    pub fn code(&self) -> u16 {
        match self {
            PageStatus::Ok => 200,
            PageStatus::NotFound => 404,
            PageStatus::Error => 500,
        }
    }
}

/// A rendered page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Page {
    pub status: PageStatus,
    pub title: String,
    pub html: String,
}

fn document(title: &str, description: &str, icon: &str, body: &str) -> String {
    format!(
        "<!DOCTYPE html>\n<html lang=\"en\"><head><meta charset=\"utf-8\"><title>{}</title><link rel=\"icon\" href=\"{}\"><meta name=\"description\" content=\"{}\"></head><body>{}</body></html>\n",
        escape(title),
        escape(icon),
        escape(description),
        body
    )
}

/// Listing page; one card per collection (none for an empty list).
pub fn listing_page(collections: &[CollectionSummary], images: &ImageUrlBuilder, head: &HeaderView) -> Page {
    let cards: String = collections
        .iter()
        .map(|c| collection_card(c, images))
        .collect();
    let body = format!(
        r#"<main class="listing">{}<section class="collections">{}</section></main>"#,
        header(head),
        cards
    );
    Page {
        status: PageStatus::Ok,
        title: SITE_TITLE.to_string(),
        html: document(SITE_TITLE, SITE_DESCRIPTION, "/favicon.ico", &body),
    }
}

/// Drop detail page rendered for the given mint state.
pub fn drop_page(collection: &Collection, state: &MintState, images: &ImageUrlBuilder, head: &HeaderView) -> Page {
    let preview = collection
        .preview_image
        .as_ref()
        .and_then(|img| images.image(img).url().ok());
    let img = match collection.preview_image.as_ref() {
        Some(i) => images
            .image(i)
            .width(400)
            .height(400)
            .fit(Fit::Crop)
            .url()
            .map(|src| {
                format!(
                    r#"<img src="{}" width="400" height="400" alt="{}" class="preview" style="object-fit: cover">"#,
                    escape(&src),
                    escape(&collection.nft_collection_name)
                )
            })
            .unwrap_or_default(),
        None => String::new(),
    };
    let body = format!(
        r#"<main class="drop">{header}<section class="drop-detail">{img}<div class="drop-info"><h1>{title}</h1><p>{description}</p>{panel}</div></section></main>"#,
        header = header(head),
        img = img,
        title = escape(&collection.title),
        description = escape(&collection.description),
        panel = mint_panel(state),
    );
    Page {
        status: PageStatus::Ok,
        title: collection.title.clone(),
        html: document(
            &collection.title,
            &collection.description,
            preview.as_deref().unwrap_or("/favicon.ico"),
            &body,
        ),
    }
}

pub fn not_found_page() -> Page {
    let title = "404 | Simply Drops";
    Page {
        status: PageStatus::NotFound,
        title: title.to_string(),
        html: document(
            title,
            SITE_DESCRIPTION,
            "/favicon.ico",
            r#"<main class="not-found"><h1>404</h1><p>This page could not be found.</p><a href="/" class="button">Return Home</a></main>"#,
        ),
    }
}

pub fn error_page() -> Page {
    let title = "Error | Simply Drops";
    Page {
        status: PageStatus::Error,
        title: title.to_string(),
        html: document(
            title,
            SITE_DESCRIPTION,
            "/favicon.ico",
            r#"<main class="error"><h1>500</h1><p>Something went wrong loading this page.</p><a href="/" class="button">Return Home</a></main>"#,
        ),
    }
}

/// Resolves paths to rendered pages from live content.
#[derive(Debug, Clone)]
pub struct Site {
    content: ContentClient,
    images: ImageUrlBuilder,
}

impl Site {
    pub fn new(content: ContentClient, images: ImageUrlBuilder) -> Self {
        Self { content, images }
    }

    pub fn content(&self) -> &ContentClient {
        &self.content
    }

    pub fn images(&self) -> &ImageUrlBuilder {
        &self.images
    }

    /// Renders `path`. Drop pages start in the initial (loading) mint state.
    pub async fn respond(&self, path: &str, head: &HeaderView) -> Result<Page, SiteError> {
        match Route::parse(path) {
            Some(Route::Listing) => {
                let collections = self.content.list_collections().await?;
                Ok(listing_page(&collections, &self.images, head))
            }
            Some(Route::Drop(slug)) => match self.content.collection_by_slug(&slug).await? {
                Some(collection) => Ok(drop_page(&collection, &MintState::default(), &self.images, head)),
                None => {
                    tracing::info!(%slug, "drop not found");
                    Ok(not_found_page())
                }
            },
            None => Ok(not_found_page()),
        }
    }

    /// Like [Site::respond], with fetch failures rendered as the error page.
    pub async fn respond_or_error(&self, path: &str, head: &HeaderView) -> Page {
        match self.respond(path, head).await {
            Ok(page) => page,
            Err(e) => {
                tracing::error!(reason = %e, path, "page render failed");
                error_page()
            }
        }
    }
}
