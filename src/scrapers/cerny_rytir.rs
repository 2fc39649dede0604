//! Parser for the cernyrytir.cz single-card catalog pages
//!
//! The listing table is laid out as groups of three rows per card:
//!
//! 1. name row: the styled card name wrapped in a link to the card image
//! 2. set/type row: `td` 0 holds the set symbol and set name, `td` 1 the type line
//! 3. stock row: `td` 0 rarity, `td` 1 quantity, `td` 2 price
//!
//! The rows live in the second `tbody` of `table.kusovkytext`; the first one is
//! the table header. Those positions are fixed by the site and not discovered.

use scraper::{ElementRef, Html, Selector};
use tracing::debug;

use crate::error::{CatalogError, Result};
use crate::models::{Alternative, CardRecord, Condition, SetRecord};
use crate::traits::CatalogConfig;

/// Rows making up one listing
const ROWS_PER_LISTING: usize = 3;

/// Index of the `tbody` holding the listings
const LISTING_BODY_INDEX: usize = 1;

#[derive(Debug, Clone, Copy)]
enum Annotation {
    Foil,
    LightlyPlayed,
    Alternative(Alternative),
}

/// Tags the site appends to card names, checked in this order.
///
/// Matching is a case-sensitive substring search and only the first
/// occurrence is removed. This is a heuristic: a card whose real name
/// contains one of these phrases will be mangled.
const ANNOTATIONS: [(&str, Annotation); 6] = [
    ("- foil", Annotation::Foil),
    ("/ lightly played", Annotation::LightlyPlayed),
    ("(retro)", Annotation::Alternative(Alternative::Retro)),
    ("(borderless)", Annotation::Alternative(Alternative::Borderless)),
    ("(extended art)", Annotation::Alternative(Alternative::ExtendedArt)),
    ("(showcase)", Annotation::Alternative(Alternative::Showcase)),
];

/// Card name with its annotations split off
#[derive(Debug, Clone, PartialEq, Eq)]
struct NormalizedName {
    name: String,
    foil: bool,
    condition: Condition,
    alternative: Alternative,
}

/// Parser for the search results and set filter of the catalog
pub struct CatalogParser {
    results_table: Selector,
    table_body: Selector,
    name: Selector,
    link: Selector,
    cell: Selector,
    set_image: Selector,
    set_select: Selector,
    set_option: Selector,
    pages_marker: String,
    image_host: String,
}

impl CatalogParser {
    /// Compile the configured selectors
    pub fn new(config: &CatalogConfig) -> Result<Self> {
        let selectors = &config.selectors;

        Ok(Self {
            results_table: compile(&selectors.results_table)?,
            table_body: compile(&selectors.table_body)?,
            name: compile(&selectors.name)?,
            link: compile(&selectors.link)?,
            cell: compile(&selectors.cell)?,
            set_image: compile(&selectors.set_image)?,
            set_select: compile(&selectors.set_select)?,
            set_option: compile(&selectors.set_option)?,
            pages_marker: selectors.pages_marker.clone(),
            image_host: config.image_host.clone(),
        })
    }

    /// Extract every listing on a result page, in document order.
    ///
    /// A page without the results table or its listing section has no
    /// listings and yields an empty vector.
    pub fn parse_page(&self, document: &Html) -> Result<Vec<CardRecord>> {
        let Some(section) = self.listing_section(document) else {
            debug!("No listing section found, treating page as empty");
            return Ok(Vec::new());
        };

        let rows: Vec<ElementRef> = section.children().filter_map(ElementRef::wrap).collect();

        rows.chunks(ROWS_PER_LISTING)
            .enumerate()
            .map(|(index, chunk)| {
                self.parse_listing(chunk).map_err(|e| match e {
                    CatalogError::Parse(message) => {
                        CatalogError::Parse(format!("listing {index}: {message}"))
                    }
                    other => other,
                })
            })
            .collect()
    }

    /// Number of result pages announced by the summary line above the table.
    ///
    /// The summary lists links to the other pages after a colon; the count is
    /// those links plus one, so a colon followed by nothing counts as 1.
    /// Returns 0 when the summary does not announce further pages.
    pub fn count_pages(&self, document: &Html) -> u32 {
        let Some(table) = document.select(&self.results_table).next() else {
            return 0;
        };
        let Some(summary) = table.prev_siblings().find_map(ElementRef::wrap) else {
            return 0;
        };

        let text = summary.text().collect::<String>();
        if !text.contains(&self.pages_marker) {
            return 0;
        }

        let tokens = text
            .split_once(':')
            .map_or(0, |(_, pages)| pages.split_whitespace().count());
        debug!("Results summary lists {} further page links", tokens);

        u32::try_from(tokens).unwrap_or(u32::MAX).saturating_add(1)
    }

    /// Options of the set filter, in document order, duplicates included.
    pub fn parse_sets(&self, document: &Html) -> Vec<SetRecord> {
        let Some(select) = document.select(&self.set_select).next() else {
            debug!("Set filter not found on page");
            return Vec::new();
        };

        select
            .children()
            .filter_map(ElementRef::wrap)
            .filter(|option| self.set_option.matches(option))
            .map(|option| SetRecord {
                set: option.value().attr("value").unwrap_or_default().to_string(),
                set_name: option.text().collect(),
            })
            .collect()
    }

    fn listing_section<'a>(&self, document: &'a Html) -> Option<ElementRef<'a>> {
        document
            .select(&self.results_table)
            .next()?
            .select(&self.table_body)
            .nth(LISTING_BODY_INDEX)
    }

    fn parse_listing(&self, chunk: &[ElementRef]) -> Result<CardRecord> {
        let name_row = chunk.first();
        let set_row = chunk.get(1);
        let stock_row = chunk.get(2);

        let original_name = name_row
            .map(|row| {
                row.select(&self.name)
                    .flat_map(|font| font.text())
                    .collect::<String>()
            })
            .unwrap_or_default();
        let normalized = normalize_name(&original_name);

        let link = name_row
            .and_then(|row| row.select(&self.link).next())
            .and_then(|anchor| anchor.value().attr("href"))
            .map(str::trim)
            .ok_or_else(|| CatalogError::parse(format!("no detail link for {original_name:?}")))?;

        let set_cell = self.cell(set_row, 0);
        let set_image = set_cell
            .and_then(|td| td.select(&self.set_image).next())
            .and_then(|img| img.value().attr("src"))
            .map(str::trim)
            .ok_or_else(|| CatalogError::parse(format!("no set symbol for {original_name:?}")))?;

        debug!("Parsed listing {} ({})", normalized.name, link);

        Ok(CardRecord {
            id: listing_id(link)?,
            original_name,
            name: normalized.name,
            set: text_of(set_cell),
            set_image_url: format!("{}{}", self.image_host, set_image),
            card_type: text_of(self.cell(set_row, 1)),
            foil: normalized.foil,
            rarity: text_of(self.cell(stock_row, 0)),
            quantity: digits_to_number(&text_of(self.cell(stock_row, 1)), "quantity")?,
            price: digits_to_number(&text_of(self.cell(stock_row, 2)), "price")?,
            condition: normalized.condition,
            alternative: normalized.alternative,
            image_url: format!("{}{}", self.image_host, link),
        })
    }

    fn cell<'a>(&self, row: Option<&ElementRef<'a>>, index: usize) -> Option<ElementRef<'a>> {
        row.and_then(|row| row.select(&self.cell).nth(index))
    }
}

fn compile(selector: &str) -> Result<Selector> {
    Selector::parse(selector).map_err(|e| CatalogError::Selector(format!("{selector}: {e:?}")))
}

fn text_of(element: Option<ElementRef>) -> String {
    element
        .map(|el| el.text().collect::<String>().trim().to_string())
        .unwrap_or_default()
}

fn normalize_name(original: &str) -> NormalizedName {
    let mut name = original.to_string();
    let mut foil = false;
    let mut condition = Condition::Nm;
    let mut alternative = Alternative::None;

    for (pattern, annotation) in ANNOTATIONS {
        if !name.contains(pattern) {
            continue;
        }
        name = name.replacen(pattern, "", 1);
        match annotation {
            Annotation::Foil => foil = true,
            Annotation::LightlyPlayed => condition = Condition::Lp,
            Annotation::Alternative(alt) => alternative = alt,
        }
    }

    NormalizedName {
        name: name.trim().to_string(),
        foil,
        condition,
        alternative,
    }
}

/// Every digit in `text` joined into one number; separators and currency are dropped.
fn digits_to_number(text: &str, field: &str) -> Result<u64> {
    let digits: String = text.chars().filter(char::is_ascii_digit).collect();
    if digits.is_empty() {
        return Err(CatalogError::parse(format!("no digits in {field} {text:?}")));
    }

    digits
        .parse()
        .map_err(|e| CatalogError::parse(format!("{field} {text:?} out of range: {e}")))
}

/// Stable listing id from the image path, e.g. `/images/kusovkymagic/TMP/057.jpg` -> `tmp_057`
fn listing_id(link: &str) -> Result<String> {
    let segments: Vec<&str> = link.split('/').collect();
    let (Some(set_code), Some(file)) = (segments.get(3), segments.get(4)) else {
        return Err(CatalogError::parse(format!("unexpected detail link {link:?}")));
    };

    let stem = file.split_once('.').map_or(*file, |(stem, _)| stem);
    Ok(format!("{}_{}", set_code.to_lowercase(), stem))
}
