//! Resolution of links between entries and assets of one [`Envelope`].
//!
//! Every link is looked up in the envelope's `includes` table, indexed once per
//! envelope. A link that cannot be resolved is reported as absent and never
//! triggers another request.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::envelope::{Asset, Entry, Envelope};

pub mod field;

/// Prefix turning the scheme-relative URLs of the asset CDN into absolute ones.
pub const SECURE_SCHEME: &str = "https:";

pub struct IncludeIndex<'e> {
    entries: HashMap<&'e str, &'e Entry>,
    assets: HashMap<&'e str, &'e Asset>,
}

impl<'e> IncludeIndex<'e> {
    pub fn build(envelope: &'e Envelope) -> Self {
        Self {
            entries: envelope
                .includes
                .entry
                .iter()
                .map(|entry| (entry.id(), entry))
                .collect(),
            assets: envelope
                .includes
                .asset
                .iter()
                .map(|asset| (asset.sys.id.as_str(), asset))
                .collect(),
        }
    }

    pub fn entry(&self, id: &str) -> Option<&'e Entry> {
        self.entries.get(id).copied()
    }

    pub fn asset(&self, id: &str) -> Option<&'e Asset> {
        self.assets.get(id).copied()
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct Image {
    pub url: String,
    pub alt: String,
    pub width: Option<u32>,
    pub height: Option<u32>,
    pub content_type: Option<String>,
}

impl Image {
    pub fn placeholder(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            alt: String::new(),
            width: None,
            height: None,
            content_type: None,
        }
    }
}

/// Extracts the target id of a link value: `{"sys": {"type": "Link", "id": …}}`.
pub fn link_id(value: &serde_json::Value) -> Option<&str> {
    let sys = value.get("sys")?;
    match sys.get("type").and_then(|ty| ty.as_str()) {
        Some("Link") | None => sys.get("id")?.as_str(),
        Some(_) => None,
    }
}

fn absolute_url(url: &str) -> Option<String> {
    if url.starts_with("//") {
        Some(format!("{SECURE_SCHEME}{url}"))
    } else if url.starts_with("https://") || url.starts_with("http://") {
        Some(url.to_owned())
    } else {
        None
    }
}

pub struct Resolver<'e> {
    index: IncludeIndex<'e>,
    placeholder: String,
}

impl<'e> Resolver<'e> {
    pub fn new(envelope: &'e Envelope, placeholder: impl Into<String>) -> Self {
        Self {
            index: IncludeIndex::build(envelope),
            placeholder: placeholder.into(),
        }
    }

    pub fn placeholder(&self) -> &str {
        &self.placeholder
    }

    fn follow(&self, value: &serde_json::Value) -> Option<&'e Entry> {
        let id = link_id(value)?;
        let resolved = self.index.entry(id);
        if resolved.is_none() {
            debug!(id, "unresolved entry link");
        }
        resolved
    }

    /// Follows the single entry link stored in `field`.
    pub fn resolve_one(&self, entry: &Entry, field: &str) -> Option<&'e Entry> {
        self.follow(entry.field(field)?)
    }

    /// Follows every entry link stored in the array `field`, dropping the
    /// links that cannot be resolved. Surviving entries keep their order.
    pub fn resolve_many(&self, entry: &Entry, field: &str) -> Vec<&'e Entry> {
        entry
            .field(field)
            .and_then(|value| value.as_array())
            .map(|links| links.iter().filter_map(|link| self.follow(link)).collect())
            .unwrap_or_default()
    }

    fn asset_image(&self, asset: &Asset) -> Option<Image> {
        let file = asset.fields.file.as_ref()?;
        let url = absolute_url(file.url.as_deref()?)?;
        let dimensions = file.details.as_ref().and_then(|d| d.image.as_ref());
        Some(Image {
            url,
            alt: asset
                .fields
                .description
                .clone()
                .or_else(|| asset.fields.title.clone())
                .unwrap_or_default(),
            width: dimensions.map(|d| d.width),
            height: dimensions.map(|d| d.height),
            content_type: file.content_type.clone(),
        })
    }

    /// Follows the asset link stored in `field`. Missing assets and assets
    /// without a usable file URL resolve to `None`.
    pub fn resolve_asset(&self, entry: &Entry, field: &str) -> Option<Image> {
        let id = link_id(entry.field(field)?)?;
        let Some(asset) = self.index.asset(id) else {
            debug!(id, field, "unresolved asset link");
            return None;
        };
        let image = self.asset_image(asset);
        if image.is_none() {
            debug!(id, field, "asset has no usable file url");
        }
        image
    }

    pub fn resolve_assets(&self, entry: &Entry, field: &str) -> Vec<Image> {
        entry
            .field(field)
            .and_then(|value| value.as_array())
            .map(|links| {
                links
                    .iter()
                    .filter_map(link_id)
                    .filter_map(|id| self.index.asset(id))
                    .filter_map(|asset| self.asset_image(asset))
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Like [`Resolver::resolve_asset`], but falls back to the placeholder image.
    pub fn image(&self, entry: &Entry, field: &str) -> Image {
        self.resolve_asset(entry, field)
            .unwrap_or_else(|| Image::placeholder(&self.placeholder))
    }

    pub fn image_url(&self, entry: &Entry, field: &str) -> String {
        self.image(entry, field).url
    }
}
