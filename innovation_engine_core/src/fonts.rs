//! A thread-safe registry of font assets injected into rendered experiments.
use std::{
    collections::{BTreeMap, HashSet},
    sync::RwLock,
};

use serde::Serialize;
use serde_with::serde_as;

/// A font made available to rendered experiment content.
///
/// The serialized form is what the injected `addFontAssets()` call receives: `familyName`,
/// `fileContentBase64` (raw file content, base64-encoded) and `descriptors`, which is serialized
/// as an explicit `null` when the font has none.
#[serde_as]
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FontAsset {
    /// Font family name the content refers to in CSS.
    pub family_name: String,
    /// Raw font file content. Serialized as a base64 string.
    #[serde_as(as = "serde_with::base64::Base64")]
    #[serde(rename = "fileContentBase64")]
    pub file_content: Vec<u8>,
    /// Style descriptors (weight, style) distinguishing variants within one family.
    pub descriptors: Option<BTreeMap<String, String>>,
}

/// `FontAssetRegistry` provides a thread-safe (`Sync`) storage for fonts registered by the host,
/// allowing registration to continue while render sessions read the collection for injection.
///
/// Registration is idempotent: a font is identified by its family name and descriptors, and
/// registering an already-known combination is a no-op. Insertion order is preserved, and the
/// first registered font is the one content falls back to as the default body font.
#[derive(Default)]
pub struct FontAssetRegistry {
    inner: RwLock<RegistryInner>,
}

#[derive(Default)]
struct RegistryInner {
    seen: HashSet<String>,
    assets: Vec<FontAsset>,
}

impl FontAssetRegistry {
    /// Create a new empty registry.
    pub fn new() -> Self {
        FontAssetRegistry::default()
    }

    /// Registers a font under the given family name, with optional descriptors distinguishing
    /// variants of the same family. Registering a (family name, descriptors) combination that is
    /// already present leaves the registry unchanged.
    pub fn register(
        &self,
        family_name: impl Into<String>,
        file_content: impl Into<Vec<u8>>,
        descriptors: Option<BTreeMap<String, String>>,
    ) {
        let family_name = family_name.into();
        let key = font_key(&family_name, &descriptors);

        // self.inner.write() should always return Ok(). Err() is possible only if the lock is
        // poisoned (writer panicked while holding the lock), which should never happen.
        let mut inner = self
            .inner
            .write()
            .expect("thread holding font registry lock should not panic");

        if !inner.seen.insert(key) {
            return;
        }
        inner.assets.push(FontAsset {
            family_name,
            file_content: file_content.into(),
            descriptors,
        });
    }

    /// Returns the registered fonts in registration order.
    pub fn assets(&self) -> Vec<FontAsset> {
        let inner = self
            .inner
            .read()
            .expect("thread holding font registry lock should not panic");

        inner.assets.clone()
    }

    /// Serializes the registered fonts to the JSON array the injected `addFontAssets()` call
    /// expects. The result reflects all registrations made up to this call.
    pub fn to_json(&self) -> String {
        let inner = self
            .inner
            .read()
            .expect("thread holding font registry lock should not panic");

        serde_json::to_string(&inner.assets)
            .expect("font assets should always be serializable to JSON")
    }
}

/// Descriptors are ordered (`BTreeMap`), so equal descriptor sets always produce the same key.
fn font_key(family_name: &str, descriptors: &Option<BTreeMap<String, String>>) -> String {
    let descriptors = serde_json::to_string(descriptors)
        .expect("font descriptors should always be serializable to JSON");
    format!("{}{}", family_name, descriptors)
}
