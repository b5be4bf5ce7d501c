//! Bank and public holiday lookup from an iCalendar feed.

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate};
use reqwest::Client;
use serde::Deserialize;
use serde_json::{json, Value};

use super::args::{TypedTool, ARGUMENT_ERROR_PREFIX};
use crate::calendar::{load_calendar, CalendarEvent};
use crate::errors::AgentError;

pub const DEFAULT_CALENDAR_URL: &str = "https://www.officeholidays.com/ics/spain/catalonia";

#[derive(Debug, Default, Deserialize)]
pub struct HolidaysArgs {
    #[serde(default)]
    pub before_date: Option<String>,
    #[serde(default)]
    pub after_date: Option<String>,
    #[serde(default)]
    pub max_count: Option<i64>,
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct HolidayFilter {
    pub before: Option<NaiveDate>,
    pub after: Option<NaiveDate>,
    pub max_count: Option<usize>,
}

impl HolidaysArgs {
    pub fn to_filter(&self) -> Result<HolidayFilter, String> {
        Ok(HolidayFilter {
            before: self.before_date.as_deref().map(parse_date).transpose()?,
            after: self.after_date.as_deref().map(parse_date).transpose()?,
            max_count: self
                .max_count
                .filter(|&n| n > 0)
                .map(|n| n as usize),
        })
    }
}

/// Accepts RFC 3339 timestamps and plain `YYYY-MM-DD` dates.
fn parse_date(value: &str) -> Result<NaiveDate, String> {
    let value = value.trim();
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.date_naive())
        .or_else(|_| NaiveDate::parse_from_str(value, "%Y-%m-%d"))
        .map_err(|_| format!("invalid date '{}', expected RFC3339", value))
}

/// Applies the filter in calendar order. Date bounds are inclusive.
pub fn select_holidays(events: &[CalendarEvent], filter: HolidayFilter) -> Vec<String> {
    let mut holidays = Vec::new();
    for event in events {
        if filter.max_count.is_some_and(|max| holidays.len() >= max) {
            break;
        }
        if filter.before.is_some_and(|before| event.date > before) {
            continue;
        }
        if filter.after.is_some_and(|after| event.date < after) {
            continue;
        }
        holidays.push(format!("{}: {}", event.date.format("%Y-%m-%d"), event.summary));
    }
    holidays
}

pub struct HolidaysTool {
    client: Client,
    calendar_url: String,
}

impl HolidaysTool {
    pub fn new(calendar_url: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            calendar_url: calendar_url.into(),
        }
    }
}

impl Default for HolidaysTool {
    fn default() -> Self {
        Self::new(DEFAULT_CALENDAR_URL)
    }
}

#[async_trait]
impl TypedTool for HolidaysTool {
    type Args = HolidaysArgs;

    const NAME: &'static str = "get_holidays";
    const DESCRIPTION: &'static str = "Gets local bank and public holidays. Each line is a single holiday in the format 'YYYY-MM-DD: Holiday Name'.";

    fn parameters_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "before_date": {
                    "type": "string",
                    "description": "Optional date in RFC3339 format to get holidays before this date. If not provided, all holidays will be returned."
                },
                "after_date": {
                    "type": "string",
                    "description": "Optional date in RFC3339 format to get holidays after this date. If not provided, all holidays will be returned."
                },
                "max_count": {
                    "type": "integer",
                    "description": "Optional maximum number of holidays to return. If not provided, all holidays will be returned."
                }
            }
        })
    }

    async fn call(&self, args: HolidaysArgs) -> Result<String, AgentError> {
        let filter = match args.to_filter() {
            Ok(filter) => filter,
            Err(e) => return Ok(format!("{}{}", ARGUMENT_ERROR_PREFIX, e)),
        };

        let events = match load_calendar(&self.client, &self.calendar_url).await {
            Ok(events) => events,
            Err(e) => {
                log::warn!("Holiday calendar unavailable: {}", e);
                return Ok("failed to load holiday events".to_string());
            }
        };

        Ok(select_holidays(&events, filter).join("\n"))
    }
}
