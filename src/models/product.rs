use serde::{Deserialize, Serialize};

/// Static metadata for the one product being watched.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductTarget {
    /// Identifier that appears in the product's link, e.g. `100-10653`.
    pub id: String,
    pub name: String,
    /// Page that gets fetched and classified.
    pub page_url: String,
    /// Canonical product link used in notifications.
    pub product_url: String,
}

impl ProductTarget {
    /// Whether a link points at this product. The id has to be a whole path
    /// segment, so `100-106531` does not count as `100-10653`.
    pub fn matches_href(&self, href: &str) -> bool {
        !self.id.is_empty() && href.split(['/', '?', '#']).any(|segment| segment == self.id)
    }
}
