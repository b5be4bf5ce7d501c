//! Minimal iCalendar (RFC 5545) reader for holiday feeds.
//!
//! Only what the holiday tool needs: all-day `VEVENT`s with their start date
//! and summary. Events with a timed start are skipped.

use chrono::NaiveDate;
use reqwest::Client;
use std::time::Duration;

use crate::errors::AgentError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CalendarEvent {
    pub date: NaiveDate,
    pub summary: String,
}

/// Downloads and parses the calendar at `link`.
pub async fn load_calendar(client: &Client, link: &str) -> Result<Vec<CalendarEvent>, AgentError> {
    log::info!("Loading calendar from {}", link);
    let response = client
        .get(link)
        .timeout(Duration::from_secs(30))
        .send()
        .await
        .map_err(|e| AgentError::tool("get_holidays", format!("failed to fetch calendar: {}", e)))?;

    let status = response.status();
    if !status.is_success() {
        return Err(AgentError::tool(
            "get_holidays",
            format!("calendar request failed with status {}", status),
        ));
    }

    let body = response
        .text()
        .await
        .map_err(|e| AgentError::tool("get_holidays", format!("failed to read calendar: {}", e)))?;

    let events = parse_ics(&body);
    log::debug!("Parsed {} all-day events", events.len());
    Ok(events)
}

/// Parses all-day events in document order.
pub fn parse_ics(input: &str) -> Vec<CalendarEvent> {
    let mut events = Vec::new();
    let mut in_event = false;
    let mut date: Option<NaiveDate> = None;
    let mut summary: Option<String> = None;

    for line in unfold_lines(input) {
        let Some((name_and_params, value)) = line.split_once(':') else {
            continue;
        };
        let mut parts = name_and_params.split(';');
        let name = parts.next().unwrap_or_default().to_ascii_uppercase();
        let params: Vec<&str> = parts.collect();

        match name.as_str() {
            "BEGIN" if value.eq_ignore_ascii_case("VEVENT") => {
                in_event = true;
                date = None;
                summary = None;
            }
            "END" if value.eq_ignore_ascii_case("VEVENT") => {
                if let (Some(date), Some(summary)) = (date.take(), summary.take()) {
                    events.push(CalendarEvent { date, summary });
                }
                in_event = false;
            }
            "DTSTART" if in_event => {
                date = parse_all_day(&params, value.trim());
            }
            "SUMMARY" if in_event => {
                summary = Some(unescape_text(value.trim()));
            }
            _ => {}
        }
    }

    events
}

fn parse_all_day(params: &[&str], value: &str) -> Option<NaiveDate> {
    let declared_date = params
        .iter()
        .any(|p| p.eq_ignore_ascii_case("VALUE=DATE"));
    if !declared_date && value.len() != 8 {
        return None;
    }
    NaiveDate::parse_from_str(value, "%Y%m%d").ok()
}

// Content lines may be folded: a line starting with a space or tab continues
// the previous one.
fn unfold_lines(input: &str) -> Vec<String> {
    let mut lines: Vec<String> = Vec::new();
    for raw in input.lines() {
        let raw = raw.trim_end_matches('\r');
        if let Some(rest) = raw.strip_prefix(' ').or_else(|| raw.strip_prefix('\t')) {
            if let Some(last) = lines.last_mut() {
                last.push_str(rest);
                continue;
            }
        }
        if !raw.is_empty() {
            lines.push(raw.to_string());
        }
    }
    lines
}

fn unescape_text(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    let mut chars = value.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('n') | Some('N') => out.push(' '),
            Some(other) => out.push(other),
            None => out.push('\\'),
        }
    }
    out
}
