use crate::error::{Error, Result};
use chrono::NaiveDate;
use regex::Regex;
use std::sync::OnceLock;

/// Lower price bound applied when the caller gives none
pub const DEFAULT_MIN_PRICE: &str = "500000000";
/// Upper price bound applied when the caller gives none
pub const DEFAULT_MAX_PRICE: &str = "20000000000";

/// Procedure states that are no longer open for bidding
pub const EXCLUDED_STATES: &[&str] = &[
    "Seleccionado",
    "Cancelado",
    "Borrador",
    "En aprobación",
    "Aprobado",
];

const DATE_FORMAT: &str = "%Y-%m-%d";

fn price_regex() -> &'static Regex {
    static PRICE: OnceLock<Regex> = OnceLock::new();
    PRICE.get_or_init(|| Regex::new(r"^\d+(\.\d+)?$").expect("price pattern is valid"))
}

/// Strip the thousands separators the filter bar displays, e.g. `500,000,000`.
pub fn unformat_number(value: &str) -> String {
    value.trim().replace(',', "")
}

/// Server-side filters for one retrieval. Validated on construction and not
/// mutated afterwards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchFilters {
    start_date: Option<NaiveDate>,
    end_date: Option<NaiveDate>,
    min_price: String,
    max_price: String,
}

impl SearchFilters {
    /// Build filters from the raw query-parameter strings.
    /// Empty strings count as absent.
    pub fn from_params(
        start_date: Option<&str>,
        end_date: Option<&str>,
        min_price: Option<&str>,
        max_price: Option<&str>,
    ) -> Result<Self> {
        let mut builder = SearchFiltersBuilder::new();
        if let Some(date) = start_date {
            builder = builder.start_date_str(date)?;
        }
        if let Some(date) = end_date {
            builder = builder.end_date_str(date)?;
        }
        if let Some(price) = min_price {
            builder = builder.min_price(price);
        }
        if let Some(price) = max_price {
            builder = builder.max_price(price);
        }
        builder.build()
    }

    pub fn start_date(&self) -> Option<NaiveDate> {
        self.start_date
    }

    pub fn end_date(&self) -> Option<NaiveDate> {
        self.end_date
    }

    pub fn min_price(&self) -> &str {
        &self.min_price
    }

    pub fn max_price(&self) -> &str {
        &self.max_price
    }

    /// The SoQL filter expression sent as the `query` parameter
    pub fn to_query(&self) -> String {
        let mut query = format!(
            "SELECT * WHERE precio_base > {} AND precio_base <= {}",
            self.min_price, self.max_price
        );
        for state in EXCLUDED_STATES {
            query.push_str(&format!(" AND estado_del_procedimiento != '{}'", state));
        }
        query.push_str(" AND adjudicado != 'Si'");

        if let Some(start) = self.start_date {
            query.push_str(&format!(
                " AND fecha_de_publicacion_del >= '{}'",
                start.format(DATE_FORMAT)
            ));
        }
        if let Some(end) = self.end_date {
            query.push_str(&format!(
                " AND fecha_de_publicacion_del <= '{}'",
                end.format(DATE_FORMAT)
            ));
        }
        query
    }

    /// Request for a single page of results
    pub fn page_request(&self, page_number: u32, page_size: usize) -> PageRequest {
        PageRequest {
            page_number,
            page_size,
            query: self.to_query(),
        }
    }

    fn validate(&self) -> Result<()> {
        for (name, price) in [("minPrice", &self.min_price), ("maxPrice", &self.max_price)] {
            if !price_regex().is_match(price) {
                return Err(Error::InvalidFilter(format!(
                    "{} must be a non-negative number, got '{}'",
                    name, price
                )));
            }
        }

        let min: f64 = self.min_price.parse().unwrap_or(0.0);
        let max: f64 = self.max_price.parse().unwrap_or(0.0);
        if min > max {
            return Err(Error::InvalidFilter(format!(
                "minPrice {} is greater than maxPrice {}",
                self.min_price, self.max_price
            )));
        }

        if let (Some(start), Some(end)) = (self.start_date, self.end_date) {
            if start > end {
                return Err(Error::InvalidFilter(format!(
                    "startDate {} is after endDate {}",
                    start, end
                )));
            }
        }

        Ok(())
    }
}

impl Default for SearchFilters {
    fn default() -> Self {
        Self {
            start_date: None,
            end_date: None,
            min_price: DEFAULT_MIN_PRICE.to_string(),
            max_price: DEFAULT_MAX_PRICE.to_string(),
        }
    }
}

/// Builder for search filters
#[derive(Debug, Clone, Default)]
pub struct SearchFiltersBuilder {
    filters: SearchFilters,
}

impl SearchFiltersBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn start_date(mut self, date: NaiveDate) -> Self {
        self.filters.start_date = Some(date);
        self
    }

    pub fn end_date(mut self, date: NaiveDate) -> Self {
        self.filters.end_date = Some(date);
        self
    }

    /// Set the start date from a `YYYY-MM-DD` string; blank clears it
    pub fn start_date_str(mut self, date: &str) -> Result<Self> {
        self.filters.start_date = parse_date("startDate", date)?;
        Ok(self)
    }

    /// Set the end date from a `YYYY-MM-DD` string; blank clears it
    pub fn end_date_str(mut self, date: &str) -> Result<Self> {
        self.filters.end_date = parse_date("endDate", date)?;
        Ok(self)
    }

    /// Set the lower price bound; blank restores the default
    pub fn min_price(mut self, price: &str) -> Self {
        self.filters.min_price = price_or_default(price, DEFAULT_MIN_PRICE);
        self
    }

    /// Set the upper price bound; blank restores the default
    pub fn max_price(mut self, price: &str) -> Self {
        self.filters.max_price = price_or_default(price, DEFAULT_MAX_PRICE);
        self
    }

    pub fn build(self) -> Result<SearchFilters> {
        self.filters.validate()?;
        Ok(self.filters)
    }
}

fn parse_date(name: &str, value: &str) -> Result<Option<NaiveDate>> {
    let value = value.trim();
    if value.is_empty() {
        return Ok(None);
    }
    NaiveDate::parse_from_str(value, DATE_FORMAT)
        .map(Some)
        .map_err(|_| Error::InvalidFilter(format!("{} must be YYYY-MM-DD, got '{}'", name, value)))
}

fn price_or_default(value: &str, default: &str) -> String {
    let value = unformat_number(value);
    if value.is_empty() {
        default.to_string()
    } else {
        value
    }
}

/// One page of the paginated query
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageRequest {
    /// 1-based page counter
    pub page_number: u32,
    pub page_size: usize,
    pub query: String,
}
