//! Presentational components: collection card, header with wallet menu, mint panel.
//!
//! Components render to HTML strings. They hold no data beyond what they are
//! given, except [WalletMenu], which tracks whether the provider dropdown is open.

use crate::content::{CollectionSummary, Image};
use crate::image::{Fit, ImageUrlBuilder};
use crate::mint::MintState;
use crate::notify::Toaster;
use crate::wallet::{WalletError, WalletKind, WalletSession};
use alloy::primitives::Address;
use std::fmt::Write;

/// Escapes text for HTML element content and attribute values.
pub fn escape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

/// `0x5Fb...0aa3`: first five and last four characters.
pub fn short_address(address: &Address) -> String {
    let s = address.to_string();
    format!("{}...{}", &s[..5], &s[s.len() - 4..])
}

fn image_tag(images: &ImageUrlBuilder, image: Option<&Image>, size: u32, alt: &str, class: &str) -> String {
    let Some(image) = image else {
        return String::new();
    };
    match images.image(image).width(size).height(size).fit(Fit::Crop).url() {
        Ok(src) => format!(
            r#"<img src="{}" width="{}" height="{}" alt="{}" class="{}" style="object-fit: cover">"#,
            escape(&src),
            size,
            size,
            escape(alt),
            class
        ),
        Err(e) => {
            tracing::debug!(reason = %e, "skipping image");
            String::new()
        }
    }
}

/// One card on the listing page, linking to `/nft/<slug>`.
pub fn collection_card(collection: &CollectionSummary, images: &ImageUrlBuilder) -> String {
    format!(
        r#"<a href="/nft/{slug}" class="collection-card">{img}<div class="collection-card-body"><div><h3>{name}</h3><p>{description}</p></div><span class="button">View Drop</span></div></a>"#,
        slug = escape(&collection.slug.current),
        img = image_tag(images, collection.main_image.as_ref(), 200, &collection.nft_collection_name, "card-image"),
        name = escape(&collection.nft_collection_name),
        description = escape(&collection.description),
    )
}

/// Header wallet menu: the account button and the provider dropdown.
#[derive(Debug, Clone, Default)]
pub struct WalletMenu {
    open: bool,
}

impl WalletMenu {
    pub fn is_open(&self) -> bool {
        self.open
    }

    /// Signs out when connected, otherwise toggles the provider dropdown.
    pub async fn press_account_button(&mut self, session: &WalletSession) {
        if session.connected_address().is_some() {
            session.disconnect().await;
        } else {
            self.open = !self.open;
        }
    }

    /// Connects with `kind`. The dropdown closes whatever the outcome; failures are
    /// logged and shown as an error toast.
    pub async fn select_provider(
        &mut self,
        session: &WalletSession,
        kind: WalletKind,
        toaster: &Toaster,
    ) -> Result<Address, WalletError> {
        let result = session.connect(kind).await;
        self.open = false;
        if let Err(e) = &result {
            tracing::warn!(reason = %e, %kind, "wallet connect failed");
            toaster.error(format!("Could not connect {}", kind));
        }
        result
    }
}

/// Everything the header needs to render.
#[derive(Debug, Clone, Default)]
pub struct HeaderView {
    pub address: Option<Address>,
    pub menu: WalletMenu,
    pub providers: Vec<WalletKind>,
}

pub fn header(view: &HeaderView) -> String {
    let mut html = String::from(
        r#"<header><a href="/" class="logo"><span class="accent">SIMPLY</span> DROPS</a><div class="wallet">"#,
    );
    if let Some(address) = &view.address {
        let _ = write!(
            html,
            "<p class=\"wallet-address\">You&#39;re logged in with wallet: {}</p>",
            escape(&short_address(address))
        );
    }
    let label = if view.address.is_some() { "Sign Out" } else { "Connect Wallet" };
    let _ = write!(html, r#"<button class="account-button">{}</button>"#, label);
    if view.menu.is_open() {
        html.push_str(r#"<div class="wallet-menu">"#);
        for kind in &view.providers {
            let _ = write!(
                html,
                r#"<button class="wallet-option" data-provider="{}"><img src="{}" width="24" height="24" alt="">{}</button>"#,
                escape(kind.label()),
                kind.icon(),
                escape(kind.label())
            );
        }
        html.push_str("</div>");
    }
    html.push_str("</div></header>");
    html
}

/// Supply badge, mint button and the way back home.
pub fn mint_panel(state: &MintState) -> String {
    let button = state.button();
    format!(
        r#"<span class="supply">{supply}</span><hr><div class="actions"><button class="mint-button"{disabled}>{label}</button><a href="/" class="button">Return Home</a></div>"#,
        supply = escape(&state.supply_label()),
        disabled = if button.enabled { "" } else { " disabled" },
        label = escape(&button.label.to_string()),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::content::{AssetRef, Slug};
    use crate::wallet::mock::MockConnector;
    use std::sync::Arc;

    fn summary(slug: &str, name: &str) -> CollectionSummary {
        CollectionSummary {
            id: format!("id-{}", slug),
            description: "<b>rare</b>".into(),
            nft_collection_name: name.into(),
            main_image: Some(Image {
                asset: AssetRef {
                    reference: "image-abc-400x400-png".into(),
                },
            }),
            slug: Slug { current: slug.into() },
        }
    }

    #[test]
    fn escape_specials() {
        assert_eq!(escape(r#"<a href="x">&'"#), "&lt;a href=&quot;x&quot;&gt;&amp;&#39;");
    }

    #[test]
    fn short_address_format() {
        let a: Address = "0x5FbDB2315678afecb367f032d93F642f64180aa3".parse().unwrap();
        assert_eq!(short_address(&a), "0x5Fb...0aa3");
    }

    #[test]
    fn card_links_to_drop_and_escapes() {
        let images = ImageUrlBuilder::new("proj", "production");
        let html = collection_card(&summary("ape-club", "Ape Club"), &images);
        assert!(html.contains(r#"href="/nft/ape-club""#));
        assert!(html.contains("<h3>Ape Club</h3>"));
        assert!(html.contains("&lt;b&gt;rare&lt;/b&gt;"));
        assert!(html.contains("abc-400x400.png?w=200&amp;h=200&amp;fit=crop"));
    }

    #[test]
    fn card_without_image() {
        let images = ImageUrlBuilder::new("proj", "production");
        let mut c = summary("x", "X");
        c.main_image = None;
        assert!(!collection_card(&c, &images).contains("<img"));
    }

    #[test]
    fn header_connected_and_disconnected() {
        let mut view = HeaderView {
            providers: WalletKind::ALL.to_vec(),
            ..Default::default()
        };
        let html = header(&view);
        assert!(html.contains("Connect Wallet"));
        assert!(!html.contains("wallet-menu"));

        view.menu.open = true;
        let html = header(&view);
        assert_eq!(html.matches("wallet-option").count(), 3);
        assert!(html.contains("Coinbase Wallet"));

        view.address = Some(Address::with_last_byte(0x42));
        let html = header(&view);
        assert!(html.contains("Sign Out"));
        assert!(html.contains("You&#39;re logged in with wallet: 0x000...0042"));
    }

    #[test]
    fn mint_panel_disabled_while_loading() {
        let html = mint_panel(&MintState::default());
        assert!(html.contains(r#"<span class="supply">Loading...</span>"#));
        assert!(html.contains("mint-button\" disabled>Loading...</button>"));
    }

    #[tokio::test]
    async fn menu_toggles_and_closes_on_any_outcome() {
        let session = WalletSession::new(vec![
            Arc::new(MockConnector::new(WalletKind::MetaMask, vec![Address::with_last_byte(1)])),
            Arc::new(MockConnector::rejecting(WalletKind::WalletConnect)),
        ]);
        let toaster = Toaster::new();
        let mut toasts = toaster.subscribe();
        let mut menu = WalletMenu::default();

        menu.press_account_button(&session).await;
        assert!(menu.is_open());
        assert!(menu
            .select_provider(&session, WalletKind::WalletConnect, &toaster)
            .await
            .is_err());
        assert!(!menu.is_open());
        assert!(toasts.try_recv().is_ok());

        menu.press_account_button(&session).await;
        let a = menu
            .select_provider(&session, WalletKind::MetaMask, &toaster)
            .await
            .unwrap();
        assert_eq!(a, Address::with_last_byte(1));
        assert!(!menu.is_open());

        // Connected: the account button signs out instead of opening the menu.
        menu.press_account_button(&session).await;
        assert!(!menu.is_open());
        assert_eq!(session.connected_address(), None);
    }
}
