use crate::{Error, LineImporter, PartialRow, Result, Value, column, importer::END_OF_INPUT};
use csv::{ReaderBuilder, StringRecord};
use std::fs::File;
use std::io::Read;
use std::path::Path;

/// Field order of a dbgen `lineitem.tbl` line, as positions in the lineitem
/// schema. The file lists part key before supplier key and puts the line
/// number fourth.
const FILE_FIELD_TO_COLUMN: [usize; 16] = [
    column::ORDER_KEY,
    column::PART_KEY,
    column::SUPP_KEY,
    column::LINE_NUMBER,
    column::QUANTITY,
    column::EXTENDED_PRICE,
    column::DISCOUNT,
    column::TAX,
    column::RETURN_FLAG,
    column::LINE_STATUS,
    column::SHIP_DATE,
    column::COMMIT_DATE,
    column::RECEIPT_DATE,
    column::SHIP_INSTRUCT,
    column::SHIP_MODE,
    column::COMMENT,
];

/// Imports dbgen `lineitem.tbl` files: `|`-separated, no header, each line
/// usually terminated by a trailing `|`.
pub struct TblImporter<R: Read> {
    reader: csv::Reader<R>,
    record: StringRecord,
    line: u64,
}

impl TblImporter<File> {
    /// Opens the file at `path`.
    ///
    /// # Errors
    /// Returns [`Error::Io`] if the file cannot be opened.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        Ok(Self::from_reader(File::open(path)?))
    }
}

impl<R: Read> TblImporter<R> {
    pub fn from_reader(reader: R) -> Self {
        let reader = ReaderBuilder::new()
            .delimiter(b'|')
            .has_headers(false)
            .flexible(true)
            .quoting(false)
            .from_reader(reader);
        Self {
            reader,
            record: StringRecord::new(),
            line: 0,
        }
    }

    /// Number of lines consumed so far.
    pub const fn lines_read(&self) -> u64 {
        self.line
    }

    fn import_error(&self, reason: impl Into<String>) -> Error {
        Error::Import {
            line: self.line,
            reason: reason.into(),
        }
    }

    fn parse_field(&self, idx: usize, raw: &str, row: &PartialRow) -> Result<Value> {
        let column = row.schema().column(idx)?;
        let value = match column.data_type() {
            crate::DataType::UInt32 => raw.parse().map(Value::UInt32).map_err(|e| {
                self.import_error(format!("{}: invalid integer `{raw}`: {e}", column.name()))
            })?,
            crate::DataType::Double => raw.parse().map(Value::Double).map_err(|e| {
                self.import_error(format!("{}: invalid number `{raw}`: {e}", column.name()))
            })?,
            crate::DataType::String => Value::String(raw.to_string()),
        };
        Ok(value)
    }
}

impl<R: Read + Send> LineImporter for TblImporter<R> {
    fn get_next_line(&mut self, row: &mut PartialRow) -> Result<u32> {
        if !self.reader.read_record(&mut self.record)? {
            return Ok(END_OF_INPUT);
        }
        self.line += 1;

        // A trailing `|` produces one extra, empty field.
        let fields = match self.record.len() {
            17 if self.record.get(16) == Some("") => 16,
            n => n,
        };
        if fields != FILE_FIELD_TO_COLUMN.len() {
            return Err(self.import_error(format!(
                "expected {} fields, found {fields}",
                FILE_FIELD_TO_COLUMN.len()
            )));
        }

        for (field, &idx) in FILE_FIELD_TO_COLUMN.iter().enumerate() {
            let raw = &self.record[field];
            let value = self.parse_field(idx, raw, row)?;
            row.set(idx, value)?;
        }

        match row.get(column::ORDER_KEY).and_then(Value::as_u32) {
            Some(END_OF_INPUT) => Err(self.import_error("order key 0 is reserved")),
            Some(order_key) => Ok(order_key),
            None => Err(self.import_error("missing order key")),
        }
    }
}
