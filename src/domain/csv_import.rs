//! Parsing of the admin bulk-upload files.
//!
//! Both files are UTF-8 (an Excel BOM is tolerated) with a header row. Rows
//! are validated completely before anything is written, and errors name the
//! 1-based data row.

use std::collections::HashMap;

use csv::{ReaderBuilder, StringRecord, Trim};

use crate::{domain::UNCATEGORIZED, error::AppError};

pub const MENU_TEMPLATE_HEADER: &str =
    "ItemID,Name,Price,Category,ImageURL,Description,Status,Allergens,SetCount,SetItems\n";
pub const SIGNAGE_TEMPLATE_HEADER: &str = "url,duration,order\n";

/// `Status` cell value marking an item as sold out.
pub const SOLD_OUT_LABEL: &str = "売り切れ";
pub const ON_SALE_LABEL: &str = "販売中";

const MENU_REQUIRED: [&str; 5] = ["ItemID", "Name", "Price", "Category", "Status"];
const SIGNAGE_REQUIRED: [&str; 3] = ["url", "duration", "order"];
const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

#[derive(Debug, Clone, PartialEq)]
pub struct MenuItemRecord {
    pub id: String,
    pub name: String,
    pub price: i64,
    pub category: String,
    pub image_url: String,
    pub description: String,
    pub is_sold_out: bool,
    pub allergens: Vec<String>,
    pub set_count: Option<i32>,
    pub set_items: Vec<String>,
}

impl MenuItemRecord {
    pub fn is_set(&self) -> bool {
        self.set_count.is_some_and(|n| n > 0)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SignageRecord {
    pub url: String,
    pub duration: i32,
    pub order: i32,
}

struct Columns(HashMap<String, usize>);

impl Columns {
    fn from_headers(headers: &StringRecord, required: &[&str]) -> Result<Self, AppError> {
        let map: HashMap<String, usize> = headers
            .iter()
            .enumerate()
            .map(|(i, h)| (h.trim().to_string(), i))
            .collect();
        let missing: Vec<&str> = required
            .iter()
            .copied()
            .filter(|c| !map.contains_key(*c))
            .collect();
        if !missing.is_empty() {
            return Err(AppError::bad_request(format!(
                "CSV is missing required columns: {}. Download the template and check the header row.",
                missing.join(", ")
            )));
        }
        Ok(Self(map))
    }

    fn get<'r>(&self, record: &'r StringRecord, name: &str) -> &'r str {
        self.0
            .get(name)
            .and_then(|i| record.get(*i))
            .map(str::trim)
            .unwrap_or("")
    }
}

fn reader(bytes: &[u8]) -> csv::Reader<&[u8]> {
    let bytes = bytes.strip_prefix(UTF8_BOM).unwrap_or(bytes);
    ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .trim(Trim::All)
        .from_reader(bytes)
}

fn row_error(row: usize, message: impl std::fmt::Display) -> AppError {
    AppError::bad_request(format!("Row {row}: {message}"))
}

/// Highest price a menu item may carry, in yen.
pub const MAX_PRICE: i64 = 10_000_000;

/// Parses a yen amount, tolerating a `¥`/`円` marker, thousands separators and
/// a trailing `.0` left behind by spreadsheet exports.
pub fn parse_price(raw: &str) -> Option<i64> {
    let cleaned: String = raw
        .trim()
        .trim_start_matches(['¥', '￥'])
        .trim_end_matches('円')
        .chars()
        .filter(|c| *c != ',')
        .collect();
    let cleaned = cleaned.strip_suffix(".0").unwrap_or(&cleaned);
    cleaned
        .parse::<i64>()
        .ok()
        .filter(|p| (0..=MAX_PRICE).contains(p))
}

/// Splits a list cell such as `卵/乳` or `から揚げ、ポテト` into trimmed entries.
pub fn split_list(raw: &str) -> Vec<String> {
    raw.split(['/', '、', ','])
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

pub fn parse_menu_csv(bytes: &[u8]) -> Result<Vec<MenuItemRecord>, AppError> {
    let mut rdr = reader(bytes);
    let columns = Columns::from_headers(rdr.headers()?, &MENU_REQUIRED)?;

    let mut items: Vec<MenuItemRecord> = Vec::new();
    for (index, record) in rdr.records().enumerate() {
        let row = index + 1;
        let record = record?;
        if record.iter().all(|cell| cell.trim().is_empty()) {
            continue;
        }

        let id = columns.get(&record, "ItemID");
        if id.is_empty() {
            return Err(row_error(row, "ItemID is empty"));
        }
        let name = columns.get(&record, "Name");
        if name.is_empty() {
            return Err(row_error(row, "Name is empty"));
        }
        let price_raw = columns.get(&record, "Price");
        let price = parse_price(price_raw)
            .ok_or_else(|| row_error(row, format!("'{price_raw}' is not a valid price")))?;
        let category = match columns.get(&record, "Category") {
            "" => UNCATEGORIZED.to_string(),
            c => c.to_string(),
        };

        let set_count = match columns.get(&record, "SetCount") {
            "" => None,
            raw => Some(raw.parse::<i32>().map_err(|_| {
                row_error(row, format!("SetCount '{raw}' is not a number"))
            })?),
        };
        let set_items = split_list(columns.get(&record, "SetItems"));
        if let Some(count) = set_count.filter(|n| *n > 0) {
            if set_items.len() < count as usize {
                return Err(row_error(
                    row,
                    format!("set needs {count} choices but only {} are listed", set_items.len()),
                ));
            }
        }

        let item = MenuItemRecord {
            id: id.to_string(),
            name: name.to_string(),
            price,
            category,
            image_url: columns.get(&record, "ImageURL").to_string(),
            description: columns.get(&record, "Description").to_string(),
            is_sold_out: columns.get(&record, "Status") == SOLD_OUT_LABEL,
            allergens: split_list(columns.get(&record, "Allergens")),
            set_count: set_count.filter(|n| *n > 0),
            set_items,
        };

        // A repeated ItemID overwrites the earlier row.
        match items.iter_mut().find(|existing| existing.id == item.id) {
            Some(existing) => *existing = item,
            None => items.push(item),
        }
    }
    Ok(items)
}

pub fn parse_signage_csv(bytes: &[u8]) -> Result<Vec<SignageRecord>, AppError> {
    let mut rdr = reader(bytes);
    let columns = Columns::from_headers(rdr.headers()?, &SIGNAGE_REQUIRED)?;

    let mut entries = Vec::new();
    for (index, record) in rdr.records().enumerate() {
        let row = index + 1;
        let record = record?;
        if record.iter().all(|cell| cell.trim().is_empty()) {
            continue;
        }
        let url = columns.get(&record, "url");
        if url.is_empty() {
            return Err(row_error(row, "url is empty"));
        }
        let duration_raw = columns.get(&record, "duration");
        let duration = duration_raw
            .parse::<i32>()
            .ok()
            .filter(|d| *d > 0)
            .ok_or_else(|| {
                row_error(row, format!("duration '{duration_raw}' must be a positive number"))
            })?;
        let order_raw = columns.get(&record, "order");
        let order = order_raw
            .parse::<i32>()
            .map_err(|_| row_error(row, format!("order '{order_raw}' is not a number")))?;
        entries.push(SignageRecord {
            url: url.to_string(),
            duration,
            order,
        });
    }
    Ok(entries)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_template_shaped_menu_with_bom() {
        let csv = "\u{feff}ItemID,Name,Price,Category,ImageURL,Description,Status\n\
                   A01,焼きそば,400,フード,/img/y.png,ソース味,販売中\n\
                   D01,ラムネ,\"¥1,000\",ドリンク,,,売り切れ\n";
        let items = parse_menu_csv(csv.as_bytes()).unwrap();
        assert_eq!(items.len(), 2);
        assert_eq!(items[0].id, "A01");
        assert_eq!(items[0].price, 400);
        assert!(!items[0].is_sold_out);
        assert_eq!(items[1].price, 1000);
        assert!(items[1].is_sold_out);
        assert_eq!(items[1].image_url, "");
    }

    #[test]
    fn missing_columns_are_reported_before_any_row() {
        let csv = "ItemID,Name,Price\nA01,焼きそば,400\n";
        let err = parse_menu_csv(csv.as_bytes()).unwrap_err();
        let message = err.to_string();
        assert!(message.contains("Category"));
        assert!(message.contains("Status"));
    }

    #[test]
    fn bad_price_names_the_row() {
        let csv = "ItemID,Name,Price,Category,Status\nA01,焼きそば,400,フード,販売中\nA02,たこ焼き,abc,フード,販売中\n";
        let err = parse_menu_csv(csv.as_bytes()).unwrap_err();
        assert!(err.to_string().contains("Row 2"));
    }

    #[test]
    fn price_beyond_cap_is_rejected() {
        let csv = "ItemID,Name,Price,Category,Status\nA01,焼きそば,5000000000000000000,フード,販売中\n";
        let err = parse_menu_csv(csv.as_bytes()).unwrap_err();
        assert!(err.to_string().contains("Row 1"));
        assert!(err.to_string().contains("not a valid price"));
    }

    #[test]
    fn set_columns_and_allergens_are_split() {
        let csv = "ItemID,Name,Price,Category,Status,Allergens,SetCount,SetItems\n\
                   S1,よくばりセット,700,セット,販売中,卵/小麦,2,から揚げ/ポテト/たこ焼き\n";
        let items = parse_menu_csv(csv.as_bytes()).unwrap();
        let set = &items[0];
        assert!(set.is_set());
        assert_eq!(set.set_count, Some(2));
        assert_eq!(set.set_items, vec!["から揚げ", "ポテト", "たこ焼き"]);
        assert_eq!(set.allergens, vec!["卵", "小麦"]);
    }

    #[test]
    fn set_with_too_few_choices_is_rejected() {
        let csv = "ItemID,Name,Price,Category,Status,SetCount,SetItems\nS1,セット,700,セット,販売中,3,から揚げ/ポテト\n";
        assert!(parse_menu_csv(csv.as_bytes()).is_err());
    }

    #[test]
    fn repeated_item_id_keeps_last_row() {
        let csv = "ItemID,Name,Price,Category,Status\nA01,旧,100,フード,販売中\nA01,新,200,フード,販売中\n";
        let items = parse_menu_csv(csv.as_bytes()).unwrap();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].name, "新");
        assert_eq!(items[0].price, 200);
    }

    #[test]
    fn empty_category_falls_back() {
        let csv = "ItemID,Name,Price,Category,Status\nA01,焼きそば,400,,販売中\n";
        let items = parse_menu_csv(csv.as_bytes()).unwrap();
        assert_eq!(items[0].category, UNCATEGORIZED);
    }

    #[test]
    fn price_cleanup() {
        assert_eq!(parse_price("500"), Some(500));
        assert_eq!(parse_price("￥1,200"), Some(1200));
        assert_eq!(parse_price("300円"), Some(300));
        assert_eq!(parse_price("450.0"), Some(450));
        assert_eq!(parse_price("-5"), None);
        assert_eq!(parse_price("free"), None);
        assert_eq!(parse_price("10,000,000"), Some(MAX_PRICE));
        assert_eq!(parse_price("10000001"), None);
        assert_eq!(parse_price("5000000000000000000"), None);
    }

    #[test]
    fn parses_signage() {
        let csv = "url,duration,order\nhttps://example.com/a.png,10,2\nhttps://example.com/b.png,5,1\n";
        let entries = parse_signage_csv(csv.as_bytes()).unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].duration, 10);
        assert_eq!(entries[1].order, 1);
    }

    #[test]
    fn signage_duration_must_be_positive() {
        let csv = "url,duration,order\nhttps://example.com/a.png,0,1\n";
        let err = parse_signage_csv(csv.as_bytes()).unwrap_err();
        assert!(err.to_string().contains("Row 1"));
    }

    #[test]
    fn templates_parse_to_nothing() {
        assert!(parse_menu_csv(MENU_TEMPLATE_HEADER.as_bytes()).unwrap().is_empty());
        assert!(parse_signage_csv(SIGNAGE_TEMPLATE_HEADER.as_bytes()).unwrap().is_empty());
    }
}
