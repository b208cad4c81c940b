//! Raw-data loading, dispatched on the declared file type.
//! A directory loads every matching file in name order and stacks them, tagging each row with its source.

use std::fs;
use std::path::{Path, PathBuf};

use calamine::Reader;
use serde_json::{Map, Value as JsonValue};
use tracing::{debug, info};

use crate::data::table::{Table, Value};
use crate::error::{Error, Result};

pub const FILE_PATH_COLUMN: &str = "file_path";
pub const GEOMETRY_COLUMN: &str = "geometry";

/// Cell texts read as missing values.
pub const NA_MARKERS: [&str; 7] = ["NaN", "nan", "NA", "N/A", "null", "None", "#N/A"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileType {
    Csv,
    Excel,
    Shapefile,
}

impl FileType {
    pub const TAGS: [&'static str; 3] = ["csv", "excel", "shp"];

    pub fn from_tag(tag: &str) -> Result<FileType> {
        match tag {
            "csv" => Ok(FileType::Csv),
            "excel" => Ok(FileType::Excel),
            "shp" => Ok(FileType::Shapefile),
            other => Err(Error::UnsupportedFileType {
                tag: other.to_string(),
                accepted: Self::TAGS.to_vec(),
            }),
        }
    }

    pub fn extensions(self) -> &'static [&'static str] {
        match self {
            FileType::Csv => &["csv"],
            FileType::Excel => &["xls", "xlsx"],
            FileType::Shapefile => &["shp"],
        }
    }

    pub fn accepts(self, path: &Path) -> bool {
        path.extension()
            .and_then(|e| e.to_str())
            .map(|e| self.extensions().iter().any(|x| x.eq_ignore_ascii_case(e)))
            .unwrap_or(false)
    }
}

/// Options read from a dataset's `kwargs` config object.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoaderOptions {
    pub delimiter: u8,
    pub sheet_name: Option<String>,
    pub skip_rows: usize,
}

impl Default for LoaderOptions {
    fn default() -> Self {
        LoaderOptions {
            delimiter: b',',
            sheet_name: None,
            skip_rows: 0,
        }
    }
}

impl LoaderOptions {
    pub fn from_kwargs(kwargs: &Map<String, JsonValue>) -> LoaderOptions {
        let mut options = LoaderOptions::default();
        for (key, value) in kwargs {
            match (key.as_str(), value) {
                ("sep" | "delimiter", JsonValue::String(s)) if s.len() == 1 => {
                    options.delimiter = s.as_bytes()[0];
                }
                ("sheet_name", JsonValue::String(s)) => options.sheet_name = Some(s.clone()),
                ("skip_rows" | "skiprows", JsonValue::Number(n)) => {
                    options.skip_rows = n.as_u64().unwrap_or(0) as usize;
                }
                _ => debug!(key = key.as_str(), "ignoring unsupported loader option"),
            }
        }
        options
    }
}

/// Load one file or one folder of `file_type` files.
pub fn load_raw_data(path: &Path, file_type: &str, options: &LoaderOptions) -> Result<Table> {
    let file_type = FileType::from_tag(file_type)?;
    if path.is_dir() {
        load_folder(path, file_type, options)
    } else {
        load_one(path, file_type, options)
    }
}

fn load_one(path: &Path, file_type: FileType, options: &LoaderOptions) -> Result<Table> {
    match file_type {
        FileType::Csv => load_one_csv(path, options),
        FileType::Excel => load_one_excel(path, options),
        FileType::Shapefile => load_one_shp(path),
    }
}

fn load_folder(dir: &Path, file_type: FileType, options: &LoaderOptions) -> Result<Table> {
    let mut files: Vec<PathBuf> = fs::read_dir(dir)
        .map_err(|err| Error::io(dir, err))?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|p| p.is_file() && file_type.accepts(p))
        .collect();
    files.sort_by(|a, b| a.file_name().cmp(&b.file_name()));

    let mut blocks = Vec::with_capacity(files.len());
    for file in files {
        let mut table = load_one(&file, file_type, options)?;
        let source = file.to_string_lossy().to_string();
        table.set_column(FILE_PATH_COLUMN, vec![Value::Text(source); table.len()]);
        info!(file = %file.display(), shape = ?table.shape(), "loaded raw file");
        blocks.push(table);
    }
    Ok(Table::concat(blocks))
}

fn infer_cell(raw: &str) -> Value {
    let trimmed = raw.trim();
    if trimmed.is_empty() || NA_MARKERS.contains(&trimmed) {
        Value::Null
    } else if let Ok(i) = trimmed.parse::<i64>() {
        Value::Int(i)
    } else if let Some(f) = trimmed.parse::<f64>().ok().filter(|f| f.is_finite()) {
        Value::Float(f)
    } else {
        Value::Text(raw.to_string())
    }
}

pub fn load_one_csv(path: &Path, options: &LoaderOptions) -> Result<Table> {
    let content = fs::read_to_string(path).map_err(|err| Error::io(path, err))?;
    let body: String = content
        .lines()
        .skip(options.skip_rows)
        .collect::<Vec<_>>()
        .join("\n");
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(options.delimiter)
        .flexible(true)
        .from_reader(body.as_bytes());

    let headers: Vec<String> = reader.headers()?.iter().map(str::to_string).collect();
    let mut table = Table::new(headers);
    for record in reader.records() {
        let record = record?;
        table.push_row(record.iter().map(infer_cell).collect());
    }
    Ok(table)
}

fn excel_cell(cell: &calamine::Data) -> Value {
    match cell {
        calamine::Data::Empty => Value::Null,
        calamine::Data::String(s) if s.trim().is_empty() || NA_MARKERS.contains(&s.trim()) => Value::Null,
        calamine::Data::String(s) => Value::Text(s.clone()),
        calamine::Data::Float(f) => Value::from(*f),
        calamine::Data::Int(i) => Value::Int(*i),
        calamine::Data::Bool(b) => Value::Bool(*b),
        other => Value::Text(other.to_string()),
    }
}

pub fn load_one_excel(path: &Path, options: &LoaderOptions) -> Result<Table> {
    let mut workbook = calamine::open_workbook_auto(path)?;
    let sheet_name = match &options.sheet_name {
        Some(name) => name.clone(),
        None => workbook
            .sheet_names()
            .first()
            .cloned()
            .ok_or_else(|| Error::Config(format!("{} has no sheets", path.display())))?,
    };
    let range = workbook.worksheet_range(&sheet_name)?;

    let mut rows = range.rows().skip(options.skip_rows);
    let headers: Vec<String> = match rows.next() {
        Some(header) => header.iter().map(|c| c.to_string()).collect(),
        None => return Ok(Table::default()),
    };
    let mut table = Table::new(headers);
    for row in rows {
        table.push_row(row.iter().map(excel_cell).collect());
    }
    Ok(table)
}

fn describe_shape(shape: &shapefile::Shape) -> String {
    match shape {
        shapefile::Shape::Point(p) => format!("POINT ({} {})", p.x, p.y),
        shapefile::Shape::Polygon(p) => format!("POLYGON ({} rings)", p.rings().len()),
        shapefile::Shape::Polyline(p) => format!("LINESTRING ({} parts)", p.parts().len()),
        other => format!("{:?}", other.shapetype()),
    }
}

fn dbase_cell(value: shapefile::dbase::FieldValue) -> Value {
    use shapefile::dbase::FieldValue;
    match value {
        FieldValue::Character(s) => match s.as_deref().map(str::trim) {
            Some(text) if !text.is_empty() => Value::Text(text.to_string()),
            _ => Value::Null,
        },
        FieldValue::Numeric(n) => n.map(Value::from).unwrap_or(Value::Null),
        FieldValue::Float(f) => f.map(|f| Value::from(f64::from(f))).unwrap_or(Value::Null),
        FieldValue::Logical(b) => b.map(Value::Bool).unwrap_or(Value::Null),
        FieldValue::Integer(i) => Value::Int(i64::from(i)),
        FieldValue::Double(d) => Value::from(d),
        FieldValue::Memo(s) => Value::Text(s),
        other => Value::Text(format!("{other:?}")),
    }
}

/// One row per shape: dBase attributes as columns plus a textual geometry summary.
pub fn load_one_shp(path: &Path) -> Result<Table> {
    let shapes = shapefile::read_as::<_, shapefile::Shape, shapefile::dbase::Record>(path)?;

    let mut blocks = Vec::with_capacity(shapes.len());
    for (shape, record) in shapes {
        let mut columns = vec![GEOMETRY_COLUMN.to_string()];
        let mut row = vec![Value::Text(describe_shape(&shape))];
        let mut fields: Vec<(String, shapefile::dbase::FieldValue)> = record.into_iter().collect();
        fields.sort_by(|a, b| a.0.cmp(&b.0));
        for (name, value) in fields {
            columns.push(name);
            row.push(dbase_cell(value));
        }
        let mut block = Table::new(columns);
        block.push_row(row);
        blocks.push(block);
    }
    Ok(Table::concat(blocks))
}
