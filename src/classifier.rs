use scraper::{ElementRef, Html, Selector};
use std::collections::HashSet;
use std::sync::LazyLock;

use crate::models::{ProductTarget, StockStatus};

/// Substrings (lowercase) that identify an Incapsula/Imperva style interstitial.
pub const CHALLENGE_MARKERS: &[&str] = &[
    "incapsula",
    "imperva",
    "incident id",
    "request unsuccessful",
    "additional security check",
    "security challenge",
    "main-iframe",
];

/// Phrases (lowercase) that mark the product as unavailable anywhere on the page.
pub const OUT_OF_STOCK_PHRASES: &[&str] = &[
    "out of stock",
    "sold out",
    "unavailable",
    "notify me when available",
    "email me when back in stock",
];

/// Returned when no rule is conclusive. Fail-open: a markup change on the
/// shop side yields a spurious "in stock" email instead of a missed restock.
pub const FAIL_OPEN_DEFAULT: StockStatus = StockStatus::AssumedInStock;

static LINKS: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("a[href]").expect("static selector"));

static SOLD_OUT_MARKERS: LazyLock<Selector> = LazyLock::new(|| {
    Selector::parse(
        "[class*=\"product-image-oos\"], \
         [class*=\"sold-out\"], \
         [class*=\"soldout\"]",
    )
    .expect("static selector")
});

static BUTTONS: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("button").expect("static selector"));

/// Everything a rule may look at, parsed once per page.
pub struct PageView<'a> {
    target: &'a ProductTarget,
    raw_lower: String,
    document: Html,
}

impl<'a> PageView<'a> {
    pub fn parse(target: &'a ProductTarget, html: &str) -> Self {
        Self {
            target,
            raw_lower: html.to_lowercase(),
            document: Html::parse_document(html),
        }
    }

    /// Links pointing at the watched product.
    fn product_anchors(&self) -> Vec<ElementRef<'_>> {
        self.document
            .select(&LINKS)
            .filter(|a| {
                a.value()
                    .attr("href")
                    .is_some_and(|href| self.target.matches_href(href))
            })
            .collect()
    }

    /// The elements "near" the product: each anchor widened to its parent tile
    /// when that parent holds no links to anything else.
    fn product_scopes(&self) -> Vec<ElementRef<'_>> {
        let mut seen = HashSet::new();
        let mut scopes = Vec::new();

        for anchor in self.product_anchors() {
            let scope = self.tile_of(anchor);
            if seen.insert(scope.id()) {
                scopes.push(scope);
            }
        }

        scopes
    }

    fn tile_of<'d>(&self, anchor: ElementRef<'d>) -> ElementRef<'d> {
        let Some(parent) = anchor.parent().and_then(ElementRef::wrap) else {
            return anchor;
        };

        if matches!(parent.value().name(), "body" | "html") {
            return anchor;
        }

        let only_this_product = parent.select(&LINKS).all(|a| {
            a.value()
                .attr("href")
                .is_some_and(|href| self.target.matches_href(href))
        });

        if only_this_product { parent } else { anchor }
    }

    fn page_text(&self) -> String {
        normalized_text(self.document.root_element())
    }
}

/// A named step of the heuristic chain. `None` means "not conclusive, keep going".
pub struct ClassifierRule {
    pub name: &'static str,
    check: fn(&PageView<'_>) -> Option<StockStatus>,
}

/// Evaluated top to bottom; the first conclusive rule wins and
/// [`FAIL_OPEN_DEFAULT`] applies when none is.
pub const RULES: &[ClassifierRule] = &[
    ClassifierRule {
        name: "security challenge",
        check: challenge_page,
    },
    ClassifierRule {
        name: "product anchor",
        check: missing_anchor,
    },
    ClassifierRule {
        name: "sold-out marker",
        check: sold_out_marker,
    },
    ClassifierRule {
        name: "disabled purchase control",
        check: disabled_purchase_control,
    },
    ClassifierRule {
        name: "enabled purchase control",
        check: enabled_purchase_control,
    },
    ClassifierRule {
        name: "out-of-stock text",
        check: out_of_stock_text,
    },
];

#[derive(Debug, Clone)]
pub struct Classifier {
    target: ProductTarget,
}

impl Classifier {
    pub fn new(target: ProductTarget) -> Self {
        Self { target }
    }

    pub fn target(&self) -> &ProductTarget {
        &self.target
    }

    pub fn classify(&self, html: &str) -> StockStatus {
        let page = PageView::parse(&self.target, html);

        for rule in RULES {
            if let Some(status) = (rule.check)(&page) {
                tracing::info!(
                    rule = rule.name,
                    status = status.code(),
                    "Classified page: {}",
                    status
                );
                return status;
            }
        }

        tracing::warn!(
            status = FAIL_OPEN_DEFAULT.code(),
            "No conclusive stock indicator found, assuming product is IN STOCK"
        );
        FAIL_OPEN_DEFAULT
    }
}

pub fn looks_like_challenge(html: &str) -> bool {
    contains_challenge_marker(&html.to_lowercase())
}

fn contains_challenge_marker(lower: &str) -> bool {
    CHALLENGE_MARKERS.iter().any(|marker| lower.contains(marker))
}

fn challenge_page(page: &PageView<'_>) -> Option<StockStatus> {
    contains_challenge_marker(&page.raw_lower).then_some(StockStatus::Blocked)
}

fn missing_anchor(page: &PageView<'_>) -> Option<StockStatus> {
    page.product_anchors()
        .is_empty()
        .then_some(StockStatus::NotFound)
}

fn sold_out_marker(page: &PageView<'_>) -> Option<StockStatus> {
    page.product_scopes()
        .into_iter()
        .flat_map(|scope| select_in_scope(scope, &SOLD_OUT_MARKERS))
        .any(|marker| normalized_text(marker).contains("sold out"))
        .then_some(StockStatus::SoldOut)
}

fn disabled_purchase_control(page: &PageView<'_>) -> Option<StockStatus> {
    page.product_scopes()
        .into_iter()
        .flat_map(|scope| select_in_scope(scope, &BUTTONS))
        .any(|button| {
            let text = normalized_text(button);
            let aria = button.value().attr("aria-label").unwrap_or_default().to_lowercase();
            let unavailable = text.contains("unavailable") || aria.contains("unavailable");
            unavailable || (is_disabled(button) && is_add_to_cart(button))
        })
        .then_some(StockStatus::SoldOut)
}

fn enabled_purchase_control(page: &PageView<'_>) -> Option<StockStatus> {
    let scopes = page.product_scopes();

    let live_button = scopes
        .iter()
        .flat_map(|scope| select_in_scope(*scope, &BUTTONS))
        .any(|button| is_add_to_cart(button) && !is_disabled(button));

    // On listing pages the product tile link is itself the way to buy.
    let live_link = page.product_anchors().into_iter().any(|a| !is_disabled(a));

    (live_button || live_link).then_some(StockStatus::InStock)
}

fn out_of_stock_text(page: &PageView<'_>) -> Option<StockStatus> {
    let text = page.page_text();
    OUT_OF_STOCK_PHRASES
        .iter()
        .find(|phrase| text.contains(*phrase))
        .map(|phrase| {
            tracing::debug!(phrase, "Found out-of-stock phrase in page text");
            StockStatus::SoldOut
        })
}

/// Descendants matching `selector`, plus `scope` itself when it matches.
fn select_in_scope<'d>(scope: ElementRef<'d>, selector: &Selector) -> Vec<ElementRef<'d>> {
    let mut found = Vec::new();
    if selector.matches(&scope) {
        found.push(scope);
    }
    found.extend(scope.select(selector));
    found
}

fn normalized_text(element: ElementRef<'_>) -> String {
    element
        .text()
        .flat_map(str::split_whitespace)
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

fn is_disabled(element: ElementRef<'_>) -> bool {
    let el = element.value();
    el.attr("disabled").is_some()
        || el.attr("aria-disabled").is_some_and(|v| v.eq_ignore_ascii_case("true"))
        || el.classes().any(|class| class.eq_ignore_ascii_case("disabled"))
}

fn is_add_to_cart(button: ElementRef<'_>) -> bool {
    let el = button.value();
    let text = normalized_text(button);

    el.classes().any(|class| class.to_lowercase().contains("add-to-cart"))
        || el.attr("data-testid") == Some("add-to-cart-button")
        || text.contains("add to cart")
        || text.contains("add to bag")
}
