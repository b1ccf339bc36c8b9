//! The asteroid tracker page: row mapping and page states.

use crate::client::NearEarthObject;
use crate::error::FeedError;
use crate::table::{ImpactTable, escape_html};

pub const HEADERS: [&str; 4] = [
    "Name",
    "Diameter (m)",
    "Relative Velocity",
    "Potentially Hazardous",
];

pub const LOADING_MESSAGE: &str = "Loading asteroid data...";
pub const ERROR_MESSAGE: &str = "Error loading asteroid data. Please try again later.";
pub const PAGE_TITLE: &str = "Asteroid Tracker";

/// Table cells for one object.
pub fn impact_row(neo: &NearEarthObject) -> Vec<String> {
    let meters = neo
        .estimated_diameter
        .as_ref()
        .and_then(|diameter| diameter.meters.as_ref());
    let min = meters
        .and_then(|m| m.estimated_diameter_min)
        .unwrap_or(0.0);
    let max = meters
        .and_then(|m| m.estimated_diameter_max)
        .unwrap_or(0.0);

    let velocity = neo
        .close_approach_data
        .first()
        .and_then(|approach| approach.relative_velocity.as_ref())
        .and_then(|velocity| velocity.kilometers_per_hour.as_deref())
        .filter(|kph| !kph.is_empty())
        .unwrap_or("no data");

    vec![
        neo.name.clone().unwrap_or_default(),
        format!("{} - {}", round_half_up(min), round_half_up(max)),
        velocity.to_string(),
        if neo.is_potentially_hazardous_asteroid {
            "YES".to_string()
        } else {
            "No".to_string()
        },
    ]
}

pub fn impact_table(objects: &[NearEarthObject]) -> ImpactTable {
    ImpactTable::new(HEADERS, objects.iter().map(impact_row).collect())
}

// Halves round toward positive infinity.
fn round_half_up(value: f64) -> i64 {
    (value + 0.5).floor() as i64
}

/// What the page shows.
#[derive(Debug, Clone, PartialEq)]
pub enum PageState {
    Loading,
    /// Carries the underlying cause for logs; the page shows [`ERROR_MESSAGE`].
    Error(String),
    Loaded(ImpactTable),
}

impl PageState {
    /// An error or an empty list both show the error message.
    pub fn from_result(result: Result<Vec<NearEarthObject>, FeedError>) -> Self {
        match result {
            Ok(objects) if objects.is_empty() => {
                PageState::Error("feed returned no near-Earth objects".to_string())
            }
            Ok(objects) => PageState::Loaded(impact_table(&objects)),
            Err(e) => PageState::Error(e.to_string()),
        }
    }

    /// Status line shown instead of the table, if any.
    pub fn message(&self) -> Option<&'static str> {
        match self {
            PageState::Loading => Some(LOADING_MESSAGE),
            PageState::Error(_) => Some(ERROR_MESSAGE),
            PageState::Loaded(_) => None,
        }
    }

    pub fn table(&self) -> Option<&ImpactTable> {
        match self {
            PageState::Loaded(table) => Some(table),
            _ => None,
        }
    }

    /// Terminal rendering: the tab-separated table, or the status line.
    pub fn render_text(&self) -> String {
        match self {
            PageState::Loaded(table) => table.to_string(),
            other => format!("{}\n", other.message().unwrap_or_default()),
        }
    }

    pub fn render_html(&self) -> String {
        let body = match self {
            PageState::Loading => format!("<p class=\"status\">{LOADING_MESSAGE}</p>"),
            PageState::Error(_) => format!("<p class=\"status error\">{}</p>", escape_html(ERROR_MESSAGE)),
            PageState::Loaded(table) => table.to_html(),
        };
        format!(
            "<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n<meta charset=\"utf-8\">\n\
             <title>{PAGE_TITLE}</title>\n<style>{STYLE}</style>\n</head>\n<body>\n\
             <h1>{PAGE_TITLE}</h1>\n<p>Welcome to the universe!</p>\n\
             <p>Near-earth objects are below:</p>\n{body}\n</body>\n</html>\n"
        )
    }
}

const STYLE: &str = "body{background:#000;color:#fff;font-family:'Special Elite',monospace;\
letter-spacing:1px;padding:6rem}.status{text-align:center}.error{color:#ef4444}\
table{border-collapse:collapse}th{color:#9ca3af;background:#18181b;text-transform:uppercase}\
th,td{padding:.75rem 1.5rem;text-align:left;white-space:nowrap}tr{border-bottom:1px solid #27272a}";
