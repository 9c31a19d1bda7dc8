use scraper::{ElementRef, Html, Selector};

use crate::config::SelectorConfig;
use crate::models::ProductRecord;
use crate::utils::error::{AppError, Result};

/// A tag selector plus class keywords. An element matches when its tag is in
/// the selector and its `class` attribute contains any keyword
/// (case-insensitive substring).
#[derive(Debug, Clone)]
struct ElementRule {
    selector: Selector,
    keywords: Vec<String>,
}

impl ElementRule {
    fn new(kind: &str, tags: &[String], keywords: &[String]) -> Result<Self> {
        let selector_str = tags
            .iter()
            .map(|tag| tag.trim().to_lowercase())
            .collect::<Vec<_>>()
            .join(", ");

        let selector = Selector::parse(&selector_str).map_err(|e| {
            AppError::Extraction(format!(
                "Invalid {} tags '{}': {:?}",
                kind, selector_str, e
            ))
        })?;

        Ok(Self {
            selector,
            keywords: keywords.iter().map(|k| k.to_lowercase()).collect(),
        })
    }

    fn class_matches(&self, element: &ElementRef) -> bool {
        match element.value().attr("class") {
            Some(class) => {
                let class = class.to_lowercase();
                self.keywords.iter().any(|keyword| class.contains(keyword.as_str()))
            }
            None => false,
        }
    }

    fn matches(&self, element: &ElementRef) -> bool {
        self.selector.matches(element) && self.class_matches(element)
    }

    /// First matching descendant in document order, excluding `scope` itself.
    fn find_within<'a>(&self, scope: ElementRef<'a>) -> Option<ElementRef<'a>> {
        scope
            .descendants()
            .skip(1)
            .filter_map(ElementRef::wrap)
            .find(|element| self.matches(element))
    }
}

/// Pulls `{name, price}` pairs out of catalog markup using loose
/// class-keyword heuristics, since the catalog's markup is not under our
/// control.
#[derive(Debug, Clone)]
pub struct ProductExtractor {
    container: ElementRule,
    name: ElementRule,
    price: ElementRule,
}

impl ProductExtractor {
    pub fn new(config: &SelectorConfig) -> Result<Self> {
        Ok(Self {
            container: ElementRule::new(
                "container",
                &config.container_tags,
                &config.container_keywords,
            )?,
            name: ElementRule::new("name", &config.name_tags, &config.name_keywords)?,
            price: ElementRule::new("price", &config.price_tags, &config.price_keywords)?,
        })
    }

    /// Parse `markup`. Every call parses afresh; nothing is cached between
    /// cycles.
    pub fn parse(&self, markup: &str) -> ParsedPage<'_> {
        ParsedPage {
            document: Html::parse_document(markup),
            extractor: self,
        }
    }

    fn record_from(&self, container: ElementRef) -> Option<ProductRecord> {
        let name = self.name.find_within(container)?;
        let price = self.price.find_within(container)?;

        Some(ProductRecord::new(element_text(name), element_text(price)))
    }
}

/// A parsed catalog page. Holds a `scraper::Html`, which is not `Send`, so
/// keep it out of `.await` points.
pub struct ParsedPage<'e> {
    document: Html,
    extractor: &'e ProductExtractor,
}

impl<'e> ParsedPage<'e> {
    /// Lazily yields one record per qualifying container, in document order.
    /// Containers missing a name or a price element are skipped. Nested
    /// qualifying containers are each considered.
    pub fn records(&self) -> impl Iterator<Item = ProductRecord> + '_ {
        let extractor: &ProductExtractor = self.extractor;
        let container = &extractor.container;

        self.document
            .select(&container.selector)
            .filter(move |element| container.class_matches(element))
            .filter_map(move |element| extractor.record_from(element))
    }

    /// Whether `name` appears anywhere in the page text (case-insensitive).
    /// Only used to help diagnose selector drift.
    /// Script and style contents are not page text.
    pub fn mentions(&self, name: &str) -> bool {
        let page_text: String = self
            .document
            .root_element()
            .descendants()
            .filter(|node| {
                !node.ancestors().any(|ancestor| {
                    ancestor
                        .value()
                        .as_element()
                        .is_some_and(|element| matches!(element.name(), "script" | "style"))
                })
            })
            .filter_map(|node| node.value().as_text().map(|text| &**text))
            .collect();
        page_text.to_lowercase().contains(&name.to_lowercase())
    }
}

fn element_text(element: ElementRef) -> String {
    element
        .text()
        .map(str::trim)
        .filter(|fragment| !fragment.is_empty())
        .collect()
}
