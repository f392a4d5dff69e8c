//! Page content resolution.
//!
//! The navigation layer only knows content keys. Turning a key into text
//! (and an optional illustration) is the job of a [`ContentResolver`].

use std::collections::HashMap;
use std::fmt;
use std::path::Path;

use serde::{Deserialize, Serialize};

use super::{Catalog, CatalogError, ModuleId, SubmoduleId};

/// Pages shipped with the bot.
pub const BUILTIN_PAGES_JSON: &str = include_str!("../../content/pages.json");

/// Address of one page of content.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ContentKey {
    pub module: ModuleId,
    pub submodule: SubmoduleId,
    pub page: u32,
}

impl ContentKey {
    #[must_use]
    pub const fn new(module: ModuleId, submodule: SubmoduleId, page: u32) -> Self {
        Self {
            module,
            submodule,
            page,
        }
    }

    /// Parses the `module.submodule.page` form used in page files.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        let mut parts = s.split('.');
        let module = parts.next()?.parse().ok()?;
        let submodule = parts.next()?.parse().ok()?;
        let page = parts.next()?.parse().ok()?;
        if parts.next().is_some() {
            return None;
        }
        Some(Self::new(module, submodule, page))
    }
}

impl fmt::Display for ContentKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.module, self.submodule, self.page)
    }
}

/// Rendered content of a single page.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PageContent {
    /// Page body, Telegram HTML.
    pub text: String,

    /// Illustration file name, relative to the images directory.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
}

/// Resolves content keys to page content.
pub trait ContentResolver: Send + Sync {
    /// Returns the page, or `None` when no usable content exists.
    fn resolve(&self, key: ContentKey) -> Option<PageContent>;
}

/// In-memory page store loaded from a JSON map of `"m.s.p"` keys.
#[derive(Debug, Clone, Default)]
pub struct PageLibrary {
    pages: HashMap<ContentKey, PageContent>,
}

impl PageLibrary {
    /// Parses a page library from JSON.
    ///
    /// Keys that are not in `module.submodule.page` form are rejected.
    ///
    /// # Errors
    ///
    /// Returns an error if the JSON is malformed or a key cannot be parsed.
    pub fn from_json(json: &str) -> Result<Self, CatalogError> {
        let raw: HashMap<String, PageContent> = serde_json::from_str(json)?;
        let mut pages = HashMap::with_capacity(raw.len());

        for (key, content) in raw {
            let parsed = ContentKey::parse(&key)
                .ok_or_else(|| CatalogError::InvalidPageKey { key: key.clone() })?;
            pages.insert(parsed, content);
        }

        Ok(Self { pages })
    }

    /// Loads the pages embedded in the binary.
    ///
    /// # Errors
    ///
    /// Returns an error only if the embedded pages are broken.
    pub fn builtin() -> Result<Self, CatalogError> {
        Self::from_json(BUILTIN_PAGES_JSON)
    }

    /// Loads pages from a JSON file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn load_from_file(path: impl AsRef<Path>) -> Result<Self, CatalogError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_json(&content)
    }

    /// Adds or replaces a page.
    pub fn insert(&mut self, key: ContentKey, content: PageContent) {
        self.pages.insert(key, content);
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.pages.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.pages.is_empty()
    }

    /// Catalog pages that have no usable content.
    #[must_use]
    pub fn missing_pages(&self, catalog: &Catalog) -> Vec<ContentKey> {
        catalog
            .page_keys()
            .filter(|key| self.resolve(*key).is_none())
            .collect()
    }

    /// Content entries that address no page of the catalog.
    #[must_use]
    pub fn orphan_pages(&self, catalog: &Catalog) -> Vec<ContentKey> {
        let mut orphans: Vec<ContentKey> = self
            .pages
            .keys()
            .filter(|key| {
                catalog
                    .submodule(key.module, key.submodule)
                    .is_none_or(|s| !s.has_page(key.page))
            })
            .copied()
            .collect();
        orphans.sort_unstable();
        orphans
    }
}

impl ContentResolver for PageLibrary {
    fn resolve(&self, key: ContentKey) -> Option<PageContent> {
        self.pages
            .get(&key)
            .filter(|content| !content.text.trim().is_empty())
            .cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_content_key_parse() {
        assert_eq!(ContentKey::parse("1.2.3"), Some(ContentKey::new(1, 2, 3)));
        assert_eq!(ContentKey::parse("1.2"), None);
        assert_eq!(ContentKey::parse("1.2.3.4"), None);
        assert_eq!(ContentKey::parse("a.b.c"), None);
        assert_eq!(ContentKey::new(4, 1, 2).to_string(), "4.1.2");
    }

    #[test]
    fn test_blank_text_is_not_found() {
        let library = PageLibrary::from_json(r#"{"1.1.1": {"text": "   "}}"#).unwrap();
        assert!(library.resolve(ContentKey::new(1, 1, 1)).is_none());
    }

    #[test]
    fn test_invalid_key_rejected() {
        assert!(PageLibrary::from_json(r#"{"intro": {"text": "x"}}"#).is_err());
    }

    #[test]
    fn test_builtin_pages_cover_builtin_catalog() {
        let catalog = Catalog::builtin().unwrap();
        let library = PageLibrary::builtin().unwrap();
        assert!(library.missing_pages(&catalog).is_empty());
        assert!(library.orphan_pages(&catalog).is_empty());
    }

    #[test]
    fn test_missing_and_orphan_pages() {
        let catalog = crate::catalog::fixtures::catalog();
        let library = PageLibrary::from_json(
            r#"{"1.1.1": {"text": "one"}, "1.1.3": {"text": "beyond"}, "7.1.1": {"text": "nowhere"}}"#,
        )
        .unwrap();

        let missing = library.missing_pages(&catalog);
        assert_eq!(
            missing,
            vec![
                ContentKey::new(1, 1, 2),
                ContentKey::new(1, 2, 1),
                ContentKey::new(2, 1, 1)
            ]
        );
        assert_eq!(
            library.orphan_pages(&catalog),
            vec![ContentKey::new(1, 1, 3), ContentKey::new(7, 1, 1)]
        );
    }
}
