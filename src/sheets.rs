//! Spreadsheet CSV adapter for the local address list and the price list.
//!
//! Both sheets are shared links; every lookup downloads a fresh CSV export.

use std::collections::HashSet;
use std::str::FromStr;

use rust_decimal::Decimal;
use tracing::debug;

use crate::error::PricingError;
use crate::location::normalize_address;
use crate::traits::{BasePrice, BasePriceProvider, LocalAddressSource};

const STREET: &str = "Ulica";
const HOUSE_NUMBER: &str = "Nr domu";
const POSTAL_CODE: &str = "Kod pocztowy";
const CITY: &str = "Miasto";

const SERVICE: &str = "Usługa";
const NETTO: &str = "Cena netto";
const BRUTTO_8: &str = "Brutto 8%";
const BRUTTO_23: &str = "Brutto 23%";
const DURATION: &str = "czas";

/// Turns a `.../edit?usp=sharing` share link into its CSV export link.
pub fn csv_export_url(share_url: &str) -> String {
    match share_url.find("/edit") {
        Some(idx) => format!("{}/gviz/tq?tqx=out:csv", &share_url[..idx]),
        None => share_url.to_string(),
    }
}

#[derive(Debug, Clone)]
pub struct SheetClient {
    client: reqwest::blocking::Client,
}

impl SheetClient {
    pub fn new(timeout_secs: u64) -> Result<Self, reqwest::Error> {
        let client = reqwest::blocking::Client::builder()
            .timeout(std::time::Duration::from_secs(timeout_secs))
            .build()?;

        Ok(Self { client })
    }

    pub fn fetch_csv(&self, share_url: &str) -> Result<String, PricingError> {
        let url = csv_export_url(share_url);
        debug!(%url, "fetching sheet export");
        let body = self
            .client
            .get(url)
            .send()
            .and_then(|resp| resp.error_for_status())
            .and_then(|resp| resp.text())?;
        Ok(body)
    }
}

/// Header-indexed view over a CSV export.
struct Table {
    headers: Vec<String>,
    rows: Vec<csv::StringRecord>,
}

impl Table {
    fn parse(text: &str) -> Result<Self, PricingError> {
        let mut reader = csv::ReaderBuilder::new()
            .flexible(true)
            .from_reader(text.as_bytes());
        let headers = reader
            .headers()?
            .iter()
            .map(|h| h.trim().to_string())
            .collect();
        let rows = reader.records().collect::<Result<Vec<_>, _>>()?;
        Ok(Self { headers, rows })
    }

    fn column(&self, name: &str) -> Option<usize> {
        self.headers.iter().position(|h| h == name)
    }

    fn require(&self, name: &str) -> Result<usize, PricingError> {
        self.column(name)
            .ok_or_else(|| PricingError::unavailable(format!("sheet has no {name:?} column")))
    }
}

fn cell(row: &csv::StringRecord, idx: usize) -> &str {
    row.get(idx).map(str::trim).unwrap_or_default()
}

/// One row of the local address sheet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AddressRow {
    pub street: String,
    pub house_number: String,
    pub postal_code: Option<String>,
    pub city: String,
}

impl AddressRow {
    /// Catalog spellings: without and with the postal code.
    pub fn variants(&self) -> Vec<String> {
        let mut variants = vec![normalize_address(&format!(
            "{} {}, {}",
            self.street, self.house_number, self.city
        ))];
        if let Some(postal) = &self.postal_code {
            variants.push(normalize_address(&format!(
                "{} {}, {} {}",
                self.street, self.house_number, postal, self.city
            )));
        }
        variants
    }
}

pub fn parse_address_rows(text: &str) -> Result<Vec<AddressRow>, PricingError> {
    let table = Table::parse(text)?;
    let street = table.require(STREET)?;
    let number = table.require(HOUSE_NUMBER)?;
    let city = table.require(CITY)?;
    let postal = table.column(POSTAL_CODE);

    Ok(table
        .rows
        .iter()
        .filter(|row| !cell(row, street).is_empty())
        .map(|row| AddressRow {
            street: cell(row, street).to_string(),
            house_number: cell(row, number).to_string(),
            postal_code: postal
                .map(|idx| cell(row, idx).to_string())
                .filter(|code| !code.is_empty()),
            city: cell(row, city).to_string(),
        })
        .collect())
}

/// Parses an amount like `1 234,50` (spaces, NBSP, decimal comma).
pub fn parse_amount(raw: &str) -> Result<Decimal, PricingError> {
    let cleaned: String = raw
        .chars()
        .filter(|c| !c.is_whitespace() && *c != '\u{a0}')
        .map(|c| if c == ',' { '.' } else { c })
        .collect();
    Decimal::from_str(&cleaned).map_err(|_| PricingError::unavailable(format!("price {raw:?} is not a number")))
}

pub fn parse_price_list(text: &str) -> Result<Vec<BasePrice>, PricingError> {
    let table = Table::parse(text)?;
    let service = table.require(SERVICE)?;
    let netto = table.require(NETTO)?;
    let brutto_8 = table.require(BRUTTO_8)?;
    let brutto_23 = table.require(BRUTTO_23)?;
    let duration = table.column(DURATION);

    table
        .rows
        .iter()
        .filter(|row| !cell(row, service).is_empty())
        .map(|row| {
            Ok(BasePrice {
                service: cell(row, service).to_string(),
                netto: parse_amount(cell(row, netto))?,
                brutto_8: parse_amount(cell(row, brutto_8))?,
                brutto_23: parse_amount(cell(row, brutto_23))?,
                duration: duration
                    .map(|idx| cell(row, idx).to_string())
                    .filter(|d| !d.is_empty()),
            })
        })
        .collect()
}

/// Local address list backed by a shared sheet.
#[derive(Debug, Clone)]
pub struct AddressSheet {
    client: SheetClient,
    url: String,
}

impl AddressSheet {
    pub fn new(client: SheetClient, url: impl Into<String>) -> Self {
        Self { client, url: url.into() }
    }

    fn rows(&self) -> Result<Vec<AddressRow>, PricingError> {
        parse_address_rows(&self.client.fetch_csv(&self.url)?)
    }
}

impl LocalAddressSource for AddressSheet {
    fn local_addresses(&self) -> Result<Vec<String>, PricingError> {
        Ok(self.rows()?.iter().flat_map(AddressRow::variants).collect())
    }

    fn street_names(&self) -> Result<Vec<String>, PricingError> {
        let mut streets: Vec<String> = self
            .rows()?
            .into_iter()
            .map(|row| row.street)
            .collect::<HashSet<_>>()
            .into_iter()
            .collect();
        streets.sort();
        Ok(streets)
    }
}

/// Service price list backed by a shared sheet.
#[derive(Debug, Clone)]
pub struct ServiceSheet {
    client: SheetClient,
    url: String,
}

impl ServiceSheet {
    pub fn new(client: SheetClient, url: impl Into<String>) -> Self {
        Self { client, url: url.into() }
    }

    fn prices(&self) -> Result<Vec<BasePrice>, PricingError> {
        parse_price_list(&self.client.fetch_csv(&self.url)?)
    }
}

/// Case-insensitive lookup by service name.
pub fn find_service(prices: Vec<BasePrice>, name: &str) -> Result<BasePrice, PricingError> {
    let wanted = name.trim().to_lowercase();
    prices
        .into_iter()
        .find(|price| price.service.trim().to_lowercase() == wanted)
        .ok_or_else(|| PricingError::NotFound(format!("service {:?} is not on the price list", name.trim())))
}

impl BasePriceProvider for ServiceSheet {
    fn base_price(&self, service: &str) -> Result<BasePrice, PricingError> {
        find_service(self.prices()?, service)
    }

    fn service_names(&self) -> Result<Vec<String>, PricingError> {
        let mut seen = HashSet::new();
        Ok(self
            .prices()?
            .into_iter()
            .map(|price| price.service)
            .filter(|name| seen.insert(name.clone()))
            .collect())
    }
}
