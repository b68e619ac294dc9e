//! Image URLs for content store assets.
//!
//! Asset references look like `image-<id>-<W>x<H>-<format>` and map onto
//! `https://cdn.sanity.io/images/<project>/<dataset>/<id>-<W>x<H>.<format>`.
//! Width, height and fit are rendering hints appended as query parameters.

use crate::content::{ContentError, Image};
use std::fmt;

const CDN_BASE: &str = "https://cdn.sanity.io/images";

/// Parsed image asset reference.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageRef {
    pub id: String,
    pub width: u32,
    pub height: u32,
    pub format: String,
}

impl ImageRef {
    pub fn parse(reference: &str) -> Result<Self, ContentError> {
        let bad = || ContentError::Decode(format!("malformed image reference: {}", reference));
        let rest = reference.strip_prefix("image-").ok_or_else(bad)?;
        let mut parts = rest.rsplitn(3, '-');
        let format = parts.next().filter(|f| !f.is_empty()).ok_or_else(bad)?;
        let dims = parts.next().ok_or_else(bad)?;
        let id = parts.next().filter(|i| !i.is_empty()).ok_or_else(bad)?;
        let (w, h) = dims.split_once('x').ok_or_else(bad)?;
        Ok(Self {
            id: id.to_string(),
            width: w.parse().map_err(|_| bad())?,
            height: h.parse().map_err(|_| bad())?,
            format: format.to_string(),
        })
    }
}

/// How the CDN fits the image into the requested box.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Fit {
    Clip,
    Crop,
    Fill,
    FillMax,
    Max,
    Scale,
    Min,
}

impl fmt::Display for Fit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Fit::Clip => "clip",
            Fit::Crop => "crop",
            Fit::Fill => "fill",
            Fit::FillMax => "fillmax",
            Fit::Max => "max",
            Fit::Scale => "scale",
            Fit::Min => "min",
        };
        f.write_str(s)
    }
}

/// Builds CDN URLs for one project/dataset.
#[derive(Debug, Clone)]
pub struct ImageUrlBuilder {
    project_id: String,
    dataset: String,
}

impl ImageUrlBuilder {
    pub fn new(project_id: impl Into<String>, dataset: impl Into<String>) -> Self {
        Self {
            project_id: project_id.into(),
            dataset: dataset.into(),
        }
    }

    /// Starts a URL for `image` with no size hints.
    pub fn image<'a>(&'a self, image: &'a Image) -> ImageUrl<'a> {
        ImageUrl {
            builder: self,
            reference: &image.asset.reference,
            width: None,
            height: None,
            fit: None,
        }
    }
}

/// A single image URL being assembled.
#[derive(Debug, Clone)]
pub struct ImageUrl<'a> {
    builder: &'a ImageUrlBuilder,
    reference: &'a str,
    width: Option<u32>,
    height: Option<u32>,
    fit: Option<Fit>,
}

impl<'a> ImageUrl<'a> {
    pub fn width(mut self, w: u32) -> Self {
        self.width = Some(w);
        self
    }

    pub fn height(mut self, h: u32) -> Self {
        self.height = Some(h);
        self
    }

    pub fn fit(mut self, fit: Fit) -> Self {
        self.fit = Some(fit);
        self
    }

    pub fn url(&self) -> Result<String, ContentError> {
        let r = ImageRef::parse(self.reference)?;
        let mut url = format!(
            "{}/{}/{}/{}-{}x{}.{}",
            CDN_BASE, self.builder.project_id, self.builder.dataset, r.id, r.width, r.height, r.format
        );
        let mut params = Vec::new();
        if let Some(w) = self.width {
            params.push(format!("w={}", w));
        }
        if let Some(h) = self.height {
            params.push(format!("h={}", h));
        }
        if let Some(fit) = self.fit {
            params.push(format!("fit={}", fit));
        }
        if !params.is_empty() {
            url.push('?');
            url.push_str(&params.join("&"));
        }
        Ok(url)
    }
}
