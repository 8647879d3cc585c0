use time::{macros::format_description, Date};

/// An inclusive window over transaction dates. Either bound may be open.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DateRange {
    pub start: Option<Date>,
    pub end: Option<Date>,
}

impl DateRange {
    pub fn new(start: Option<Date>, end: Option<Date>) -> Self {
        Self { start, end }
    }

    /// The unbounded range, matching every date.
    pub fn all() -> Self {
        Self::default()
    }

    pub fn contains(&self, date: Date) -> bool {
        self.start.map_or(true, |start| date >= start) && self.end.map_or(true, |end| date <= end)
    }
}

/// Parse an optional `YYYY-MM-DD` value. Missing and blank values are both treated as no bound.
pub fn parse_bound(field: &str, raw: Option<&str>) -> Result<Option<Date>, String> {
    match raw.map(str::trim) {
        None | Some("") => Ok(None),
        Some(value) => parse_date(value)
            .map(Some)
            .map_err(|_| format!("{field}: Date has wrong format. Use one of these formats instead: YYYY-MM-DD.")),
    }
}

pub fn parse_date(value: &str) -> Result<Date, time::error::Parse> {
    Date::parse(value, format_description!("[year]-[month]-[day]"))
}
