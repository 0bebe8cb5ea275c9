//! dBase III (`.dbf`) reader.
//!
//! Layout:
//!
//! Header: version (1) + last update YYMMDD (3) + record count (u32 LE)
//! + header length (u16 LE) + record length (u16 LE) + reserved (20),
//! then one 32-byte descriptor per field, terminated by `0x0D`.
//! Descriptor: name (11, NUL padded) + type (1) + reserved (4)
//! + length (1) + decimal count (1) + reserved (14).
//! Each record: deletion flag (1, `*` when deleted) + fixed-width fields.
//! Trailer: optional `0x1A`.
//!
//! Text is ISO-8859-1. Blank fields decode to [`Value::Null`].

use std::collections::HashMap;
use std::fs::File;
use std::io::{BufReader, ErrorKind, Read};
use std::path::Path;
use std::str::FromStr;
use std::sync::Arc;

use bytes::Buf;
use chrono::NaiveDate;
use rust_decimal::Decimal;
use tracing::debug;

use crate::core::Value;
use crate::error::{ImportError, Result};

/// Fixed part of the header before the field descriptors.
const HEADER_PREFIX: usize = 32;

/// Size of one field descriptor.
const DESCRIPTOR_SIZE: usize = 32;

/// Terminates the field descriptor array.
const HEADER_TERMINATOR: u8 = 0x0D;

/// Optional end-of-file marker after the last record.
const EOF_MARKER: u8 = 0x1A;

const DELETED_FLAG: u8 = b'*';

/// dBase field type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldType {
    Character,
    Numeric,
    Floating,
    Date,
    Logical,
}

impl FieldType {
    fn from_code(code: u8) -> Result<Self> {
        match code {
            b'C' => Ok(FieldType::Character),
            b'N' => Ok(FieldType::Numeric),
            b'F' => Ok(FieldType::Floating),
            b'D' => Ok(FieldType::Date),
            b'L' => Ok(FieldType::Logical),
            other => Err(ImportError::Dbf(format!(
                "unsupported field type {:?}",
                other as char
            ))),
        }
    }
}

/// One column of the source file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldDescriptor {
    pub name: String,
    pub field_type: FieldType,
    pub length: u8,
    pub decimal_count: u8,
}

/// Parsed file header.
#[derive(Debug, Clone)]
pub struct DbfHeader {
    pub version: u8,
    pub last_update: Option<NaiveDate>,
    pub record_count: u32,
    pub header_length: u16,
    pub record_length: u16,
    pub fields: Vec<FieldDescriptor>,
}

impl DbfHeader {
    /// Parse a complete header block (`header_length` bytes).
    fn parse(mut buf: &[u8]) -> Result<Self> {
        if buf.len() < HEADER_PREFIX + 1 {
            return Err(ImportError::Dbf("header too short".into()));
        }

        let version = buf.get_u8();
        let (yy, mm, dd) = (buf.get_u8(), buf.get_u8(), buf.get_u8());
        let record_count = buf.get_u32_le();
        let header_length = buf.get_u16_le();
        let record_length = buf.get_u16_le();
        buf.advance(20);

        // Two-digit years are offsets from 1900; dBase writers past 1999 keep counting.
        let last_update = NaiveDate::from_ymd_opt(1900 + yy as i32, mm as u32, dd as u32);

        let mut fields = Vec::new();
        loop {
            match buf.first() {
                Some(&HEADER_TERMINATOR) => break,
                Some(_) if buf.len() >= DESCRIPTOR_SIZE => {}
                _ => {
                    return Err(ImportError::Dbf(
                        "field descriptors not terminated".into(),
                    ))
                }
            }

            let name = latin1(trim_nul(&buf[..11])).trim().to_string();
            buf.advance(11);
            let field_type = FieldType::from_code(buf.get_u8())?;
            buf.advance(4);
            let length = buf.get_u8();
            let decimal_count = buf.get_u8();
            buf.advance(14);

            if name.is_empty() {
                return Err(ImportError::Dbf("field with empty name".into()));
            }
            fields.push(FieldDescriptor {
                name,
                field_type,
                length,
                decimal_count,
            });
        }

        let data_width: usize = fields.iter().map(|f| f.length as usize).sum();
        if data_width + 1 != record_length as usize {
            return Err(ImportError::Dbf(format!(
                "record length {} does not match field widths {} + 1",
                record_length, data_width
            )));
        }

        Ok(Self {
            version,
            last_update,
            record_count,
            header_length,
            record_length,
            fields,
        })
    }

    /// Whether the file declares a field with this name.
    pub fn has_field(&self, name: &str) -> bool {
        self.fields.iter().any(|f| f.name.eq_ignore_ascii_case(name))
    }
}

/// One decoded record.
#[derive(Debug, Clone)]
pub struct Record {
    values: Vec<Value>,
    index: Arc<HashMap<String, usize>>,
}

impl Record {
    /// Value of a field by name (case-insensitive).
    ///
    /// # Errors
    ///
    /// Returns [`ImportError::MissingField`] when the file has no such field.
    pub fn get(&self, name: &str) -> Result<&Value> {
        let pos = match self.index.get(name) {
            Some(pos) => Some(*pos),
            None => self.index.get(&name.to_ascii_uppercase()).copied(),
        };
        pos.map(|p| &self.values[p])
            .ok_or_else(|| ImportError::MissingField(name.to_string()))
    }

    /// Values in header order.
    pub fn values(&self) -> &[Value] {
        &self.values
    }
}

/// Streaming record reader.
///
/// Yields live records in file order; deleted records are skipped. The
/// underlying handle is closed when the reader is dropped.
pub struct DbfReader<R> {
    reader: R,
    header: DbfHeader,
    index: Arc<HashMap<String, usize>>,
    buf: Vec<u8>,
    consumed: u32,
    done: bool,
}

impl DbfReader<BufReader<File>> {
    /// Open a `.dbf` file.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = File::open(path)?;
        Self::new(BufReader::with_capacity(256 * 1024, file))
    }
}

impl<R: Read> DbfReader<R> {
    /// Read the header from a byte stream positioned at the start of the file.
    pub fn new(mut reader: R) -> Result<Self> {
        let mut prefix = [0u8; HEADER_PREFIX];
        reader.read_exact(&mut prefix).map_err(truncated("header"))?;

        let header_length = u16::from_le_bytes([prefix[8], prefix[9]]) as usize;
        if header_length < HEADER_PREFIX + 1 {
            return Err(ImportError::Dbf(format!(
                "invalid header length {}",
                header_length
            )));
        }

        let mut block = vec![0u8; header_length];
        block[..HEADER_PREFIX].copy_from_slice(&prefix);
        reader
            .read_exact(&mut block[HEADER_PREFIX..])
            .map_err(truncated("header"))?;

        let header = DbfHeader::parse(&block)?;
        let index = header
            .fields
            .iter()
            .enumerate()
            .map(|(i, f)| (f.name.to_ascii_uppercase(), i))
            .collect();

        debug!(
            "dBase header: version {:#04x}, {} records, {} fields",
            header.version,
            header.record_count,
            header.fields.len()
        );

        Ok(Self {
            reader,
            buf: vec![0u8; header.record_length as usize],
            header,
            index: Arc::new(index),
            consumed: 0,
            done: false,
        })
    }

    pub fn header(&self) -> &DbfHeader {
        &self.header
    }

    /// Read the next raw record into `self.buf`. Returns false at end of data.
    fn fill_next(&mut self) -> Result<bool> {
        if self.consumed >= self.header.record_count {
            return Ok(false);
        }

        let (flag, rest) = self.buf.split_at_mut(1);
        match self.reader.read_exact(flag) {
            Ok(()) => {}
            Err(e) if e.kind() == ErrorKind::UnexpectedEof => return Ok(false),
            Err(e) => return Err(e.into()),
        }
        if flag[0] == EOF_MARKER {
            return Ok(false);
        }
        self.reader.read_exact(rest).map_err(truncated("record"))?;
        self.consumed += 1;
        Ok(true)
    }

    fn decode(&self) -> Result<Record> {
        let mut values = Vec::with_capacity(self.header.fields.len());
        let mut offset = 1;
        for field in &self.header.fields {
            let raw = &self.buf[offset..offset + field.length as usize];
            offset += field.length as usize;
            values.push(decode_value(field, raw)?);
        }
        Ok(Record {
            values,
            index: Arc::clone(&self.index),
        })
    }
}

impl<R: Read> Iterator for DbfReader<R> {
    type Item = Result<Record>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        loop {
            match self.fill_next() {
                Ok(true) if self.buf[0] == DELETED_FLAG => {
                    debug!("Skipping deleted record {}", self.consumed);
                    continue;
                }
                Ok(true) => {
                    let record = self.decode();
                    if record.is_err() {
                        self.done = true;
                    }
                    return Some(record);
                }
                Ok(false) => {
                    self.done = true;
                    return None;
                }
                Err(e) => {
                    self.done = true;
                    return Some(Err(e));
                }
            }
        }
    }
}

fn truncated(what: &'static str) -> impl Fn(std::io::Error) -> ImportError {
    move |e| {
        if e.kind() == ErrorKind::UnexpectedEof {
            ImportError::Dbf(format!("truncated {}", what))
        } else {
            ImportError::Io(e)
        }
    }
}

fn trim_nul(raw: &[u8]) -> &[u8] {
    match raw.iter().position(|&b| b == 0) {
        Some(end) => &raw[..end],
        None => raw,
    }
}

fn latin1(raw: &[u8]) -> String {
    raw.iter().map(|&b| b as char).collect()
}

/// Decode one fixed-width field.
fn decode_value(field: &FieldDescriptor, raw: &[u8]) -> Result<Value> {
    let text = latin1(trim_nul(raw));
    let bad = |what: &str| {
        ImportError::Dbf(format!(
            "field {}: invalid {} {:?}",
            field.name, what, text
        ))
    };

    match field.field_type {
        FieldType::Character => {
            let trimmed = text.trim_end();
            if trimmed.is_empty() {
                Ok(Value::Null)
            } else {
                Ok(Value::Character(trimmed.to_string()))
            }
        }
        FieldType::Numeric | FieldType::Floating => {
            let trimmed = text.trim();
            if trimmed.is_empty() || trimmed.bytes().all(|b| b == b'*') {
                return Ok(Value::Null);
            }
            Decimal::from_str(trimmed)
                .or_else(|_| Decimal::from_scientific(trimmed))
                .map(Value::Numeric)
                .map_err(|_| bad("number"))
        }
        FieldType::Date => {
            let trimmed = text.trim();
            if trimmed.is_empty() || trimmed.bytes().all(|b| b == b'0') {
                return Ok(Value::Null);
            }
            NaiveDate::parse_from_str(trimmed, "%Y%m%d")
                .map(Value::Date)
                .map_err(|_| bad("date"))
        }
        FieldType::Logical => match text.trim() {
            "T" | "t" | "Y" | "y" => Ok(Value::Logical(true)),
            "F" | "f" | "N" | "n" => Ok(Value::Logical(false)),
            "?" | "" => Ok(Value::Null),
            _ => Err(bad("logical")),
        },
    }
}
