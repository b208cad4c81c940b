//! Header cleaning and the derived date/year columns shared by the people datasets.

use std::sync::OnceLock;

use chrono::{Datelike, NaiveDate};
use regex::Regex;
use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;

use crate::data::table::{Table, Value};

/// Day/month/two-digit year, e.g. `01/06/85`.
pub const DATE_FORMAT: &str = "%d/%m/%y";

fn special_chars() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r#"['’!@#$%^&*()\[\]{};:/<>?\\|.,`~\-+="°\s]"#).expect("static regex")
    })
}

fn repeated_underscores() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"_+").expect("static regex"))
}

fn strip_accents(s: &str) -> String {
    s.nfd().filter(|c| !is_combining_mark(*c)).collect()
}

/// Strip accents, turn special characters and spaces into underscores, collapse runs, lowercase.
pub fn clean_column_name(name: &str) -> String {
    let stripped = strip_accents(name);
    let underscored = special_chars().replace_all(&stripped, "_");
    let collapsed = repeated_underscores().replace_all(&underscored, "_");
    collapsed.to_lowercase()
}

pub fn clean_column_names<S: AsRef<str>>(columns: &[S]) -> Vec<String> {
    columns.iter().map(|c| clean_column_name(c.as_ref())).collect()
}

/// Parse a cell with `format`. Dates pass through; empty or unparseable cells become null.
pub fn parse_date(value: &Value, format: &str) -> Value {
    match value {
        Value::Date(d) => Value::Date(*d),
        Value::Text(s) => NaiveDate::parse_from_str(s.trim(), format)
            .map(Value::Date)
            .unwrap_or(Value::Null),
        _ => Value::Null,
    }
}

/// Floor `year` to a multiple of `width`.
pub fn group_years(year: i64, width: u32) -> i64 {
    let width = i64::from(width.max(1));
    year.div_euclid(width) * width
}

pub fn year_group_column(width: u32) -> String {
    match width {
        5 => "birth_half_decade".to_string(),
        10 => "birth_decade".to_string(),
        other => format!("birth_year_group_{other}"),
    }
}

/// Parse `birth_date` / `death_date` and derive `birth_year` plus its year-group bucket.
/// Absent date columns are tolerated; the derived columns are then null.
pub fn derive_birth_columns(table: &mut Table, date_format: &str, group_width: u32) {
    for column in ["birth_date", "death_date"] {
        let mut unparsed = 0usize;
        let mapped = table.map_column(column, |cell| {
            let parsed = parse_date(cell, date_format);
            if parsed.is_null() && !cell.is_null() {
                unparsed += 1;
            }
            parsed
        });
        if mapped.is_err() {
            tracing::warn!(column, "date column missing, derived values will be null");
            continue;
        }
        if unparsed > 0 {
            tracing::warn!(column, unparsed, format = date_format, "unparseable dates set to null");
        }
    }

    let years: Vec<Value> = match table.column("birth_date") {
        Ok(cells) => cells
            .into_iter()
            .map(|c| c.as_date().map(|d| i64::from(d.year())).into())
            .collect(),
        Err(_) => vec![Value::Null; table.len()],
    };
    let groups: Vec<Value> = years
        .iter()
        .map(|y| y.as_i64().map(|y| group_years(y, group_width)).into())
        .collect();
    table.set_column("birth_year", years);
    table.set_column(&year_group_column(group_width), groups);
}
