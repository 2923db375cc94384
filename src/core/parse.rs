use crate::domain::model::{Category, Listing};
use scraper::{Html, Selector};

const PRICE_SELECTOR: &str = "bdi.new-price span.format-money-int";
const TAG_SELECTOR: &str = "a.tag-item";
const FIELD_TAG_SELECTOR: &str = "a.tag-item, .tag-item";

const ROOMS_LABEL: &str = "Numri i dhomave";
const AREA_LABEL: &str = "Sipërfaqe";

fn selector(css: &str) -> Selector {
    Selector::parse(css).expect("static selector")
}

/// Fields parsed from one detail page, each independently absent on parse
/// failure. Only price and a positive area make the record usable.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct ListingDetail {
    pub price: Option<i64>,
    pub rooms: Option<u32>,
    pub area: Option<f64>,
    pub category: Category,
}

impl ListingDetail {
    /// `None` means "insufficient data", the expected and frequent case;
    /// callers drop it without logging an error.
    pub fn into_listing(self, neighborhood: &str) -> Option<Listing> {
        let price = self.price?;
        let area = self.area.filter(|a| *a > 0.0)?;
        Some(Listing::new(
            neighborhood,
            price,
            self.rooms,
            area,
            self.category,
        ))
    }
}

/// Strips thousands separators and rejects anything that is not purely
/// digits afterwards.
pub fn parse_price(raw: &str) -> Option<i64> {
    let cleaned: String = raw.chars().filter(|c| *c != '.' && *c != ',').collect();
    let cleaned = cleaned.trim();
    if cleaned.is_empty() || !cleaned.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }
    cleaned.parse().ok()
}

/// Integer portion before a "+" suffix ("2+1" → 2).
fn parse_rooms(raw: &str) -> Option<u32> {
    raw.split('+').next()?.trim().parse().ok()
}

/// First whitespace token with decimal comma normalized ("52,5 m2" → 52.5).
fn parse_area(raw: &str) -> Option<f64> {
    raw.split_whitespace().next()?.replace(',', ".").parse().ok()
}

fn element_text(el: scraper::ElementRef<'_>) -> String {
    el.text().collect::<String>().trim().to_string()
}

/// Pure extraction of one rendered detail page.
pub fn parse_listing_detail(html: &str) -> ListingDetail {
    let doc = Html::parse_document(html);
    let mut detail = ListingDetail::default();

    if let Some(el) = doc.select(&selector(PRICE_SELECTOR)).next() {
        // Prefer the machine-readable `value` attribute, fall back to text.
        let raw = match el.value().attr("value") {
            Some(value) if !value.is_empty() => value.to_string(),
            _ => element_text(el),
        };
        detail.price = parse_price(&raw);
    }

    // First marker tag wins. No marker leaves the explicit default (sale),
    // which may misclassify untagged rentals; intentionally left as is.
    for tag in doc.select(&selector(TAG_SELECTOR)) {
        let text = element_text(tag).to_lowercase();
        if text.contains("qera") {
            detail.category = Category::Rent;
            break;
        }
        if text.contains("shit") {
            detail.category = Category::Sale;
            break;
        }
    }

    let label_selector = selector("span");
    let value_selector = selector("bdi");
    for tag in doc.select(&selector(FIELD_TAG_SELECTOR)) {
        let (Some(label_el), Some(value_el)) = (
            tag.select(&label_selector).next(),
            tag.select(&value_selector).next(),
        ) else {
            continue;
        };
        let label = element_text(label_el);
        let label = label.trim_end_matches(':');
        let value = element_text(value_el);

        if label.contains(ROOMS_LABEL) {
            detail.rooms = parse_rooms(&value);
        } else if label.contains(AREA_LABEL) {
            detail.area = parse_area(&value);
        }
    }

    detail
}
