//! Instruction templates and URL classification.
//!
//! Every instruction the backend ever sees is defined here, next to the
//! predicate that selects it. [`TEMPLATES`] is an ordered table evaluated top
//! to bottom; the first predicate that matches wins and [`GENERIC`] catches
//! everything else. Supporting a new site means adding one row. Order matters
//! because predicates may overlap, so the most specific rows come first.
//!
//! Predicates see a parsed [`UrlParts`], never the raw string, so host checks
//! are exact-or-subdomain: `netflix.com` does not match a rule for `x.com`.

use serde::{Deserialize, Serialize};
use std::fmt;
use url::Url;

/// Which template a URL was classified as.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TemplateKind {
    EcommerceOrders,
    FoodDeliveryOrders,
    SocialFeed,
    Generic,
}

impl fmt::Display for TemplateKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            TemplateKind::EcommerceOrders => "ecommerce-orders",
            TemplateKind::FoodDeliveryOrders => "food-delivery-orders",
            TemplateKind::SocialFeed => "social-feed",
            TemplateKind::Generic => "generic",
        };
        f.write_str(s)
    }
}

/// Lower-cased host and path of a source URL.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UrlParts {
    pub host: String,
    /// Path plus query string.
    pub path: String,
}

impl UrlParts {
    /// Parse leniently: a missing scheme is assumed to be `https://`, and an
    /// unparseable string keeps an empty host with the raw text as path.
    pub fn parse(raw: &str) -> Self {
        let raw = raw.trim();
        // A bare "host/path" is relative; "host:port/path" parses with the host
        // as its scheme. Both get an https:// prefix.
        let parsed = match Url::parse(raw) {
            Ok(u) if u.host_str().is_some() => Ok(u),
            _ => Url::parse(&format!("https://{raw}")),
        };
        match parsed {
            Ok(u) => {
                let host = u
                    .host_str()
                    .unwrap_or_default()
                    .trim_start_matches("www.")
                    .to_ascii_lowercase();
                let mut path = u.path().to_ascii_lowercase();
                if let Some(q) = u.query() {
                    path.push('?');
                    path.push_str(&q.to_ascii_lowercase());
                }
                Self { host, path }
            }
            Err(_) => Self {
                host: String::new(),
                path: raw.to_ascii_lowercase(),
            },
        }
    }

    /// True when the host is `domain` or a subdomain of it.
    pub fn host_is(&self, domain: &str) -> bool {
        self.host == domain
            || self
                .host
                .strip_suffix(domain)
                .is_some_and(|prefix| prefix.ends_with('.'))
    }

    /// True when any dot-separated host label equals `label`.
    pub fn host_has_label(&self, label: &str) -> bool {
        self.host.split('.').any(|l| l == label)
    }
}

/// One row of the classification table.
pub struct PromptTemplate {
    pub kind: TemplateKind,
    pub matches: fn(&UrlParts) -> bool,
    /// Site-specific directive, appended after the generic preamble.
    pub instruction: &'static str,
}

impl PromptTemplate {
    /// Full instruction text for `url`.
    pub fn render(&self, url: &str) -> String {
        let preamble = generic_preamble(url);
        if self.instruction.is_empty() {
            preamble
        } else {
            format!("{preamble}\n\n{}", self.instruction)
        }
    }
}

impl fmt::Debug for PromptTemplate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PromptTemplate")
            .field("kind", &self.kind)
            .finish_non_exhaustive()
    }
}

// ── Templates ────────────────────────────────────────────────────────────────

pub const ECOMMERCE_ORDERS_PROMPT: &str = "This is an order history from an online store. \
Please only include the list of products and their prices. Only include items that were \
purchased. Number each item. Don't include items from the 'Recommended based on your \
purchase' section or any other recommendation section.";

pub const FOOD_DELIVERY_ORDERS_PROMPT: &str = "This is an order history from a food delivery \
service. List each order with the restaurant name followed by the order details (items, \
date and total when shown). Number each order.";

pub const SOCIAL_FEED_PROMPT: &str = "This is a social media feed. Summarize the main topics \
being discussed as a short numbered list. Keep each item to one or two sentences and include \
a reference link to a representative post for every item. Be concise.";

/// Ordered, most specific first. [`GENERIC`] is the implicit last row.
pub static TEMPLATES: &[PromptTemplate] = &[
    PromptTemplate {
        kind: TemplateKind::EcommerceOrders,
        matches: is_ecommerce_orders,
        instruction: ECOMMERCE_ORDERS_PROMPT,
    },
    PromptTemplate {
        kind: TemplateKind::FoodDeliveryOrders,
        matches: is_food_delivery_orders,
        instruction: FOOD_DELIVERY_ORDERS_PROMPT,
    },
    PromptTemplate {
        kind: TemplateKind::SocialFeed,
        matches: is_social_feed,
        instruction: SOCIAL_FEED_PROMPT,
    },
];

/// The catch-all. Always matches.
pub static GENERIC: PromptTemplate = PromptTemplate {
    kind: TemplateKind::Generic,
    matches: always,
    instruction: "",
};

fn generic_preamble(url: &str) -> String {
    format!(
        "Summarize the following text from the following website {url}. \
This may include both web page content and text extracted from screenshots."
    )
}

fn is_ecommerce_orders(u: &UrlParts) -> bool {
    u.host_has_label("amazon")
        && ["order-history", "your-orders", "/gp/css/order"]
            .iter()
            .any(|p| u.path.contains(p))
}

fn is_food_delivery_orders(u: &UrlParts) -> bool {
    const HOSTS: &[&str] = &[
        "doordash.com",
        "ubereats.com",
        "grubhub.com",
        "deliveroo.co.uk",
        "postmates.com",
    ];
    HOSTS.iter().any(|h| u.host_is(h)) && u.path.contains("order")
}

fn is_social_feed(u: &UrlParts) -> bool {
    const HOSTS: &[&str] = &[
        "x.com",
        "twitter.com",
        "reddit.com",
        "facebook.com",
        "linkedin.com",
        "bsky.app",
        "threads.net",
        "mastodon.social",
    ];
    HOSTS.iter().any(|h| u.host_is(h))
}

fn always(_: &UrlParts) -> bool {
    true
}

// ── Selection ────────────────────────────────────────────────────────────────

/// The instruction chosen for a request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectedPrompt {
    pub kind: TemplateKind,
    pub instruction: String,
}

/// First matching template for `url`, or [`GENERIC`].
pub fn classify(url: &str) -> &'static PromptTemplate {
    let parts = UrlParts::parse(url);
    TEMPLATES
        .iter()
        .find(|t| (t.matches)(&parts))
        .unwrap_or(&GENERIC)
}

/// Select and render the instruction for `url`, appending caller overrides.
///
/// Non-blank `extra` is appended verbatim on its own block so the backend can
/// tell base instructions from caller overrides.
pub fn select_prompt(url: &str, extra: Option<&str>) -> SelectedPrompt {
    let template = classify(url);
    let mut instruction = template.render(url);
    if let Some(extra) = extra.filter(|e| !e.trim().is_empty()) {
        instruction.push_str("\n\nAdditional instructions:\n");
        instruction.push_str(extra);
    }
    SelectedPrompt {
        kind: template.kind,
        instruction,
    }
}
