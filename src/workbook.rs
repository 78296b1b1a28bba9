//! Spreadsheet input and output.
//!
//! Input is one workbook with two sheets. Each sheet's first row is a header
//! and its first column is the row id:
//! - `Group`: group name, `Size` (target subject count),
//! - `Size`: subject id, `Short`, `Long` (other columns ignored).
//!
//! Output is one sheet per group listing subject id and size.

use std::collections::HashSet;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use calamine::{Data, Reader, Sheets, open_workbook_auto};
use tracing::{debug, info};

use crate::core::roster::{GroupSchema, GroupSpec, Roster, Subject};
use crate::core::search::Partition;
use crate::error::{Error, Result};

pub const GROUP_SHEET: &str = "Group";
pub const SIZE_SHEET: &str = "Size";
pub const SIZE_COLUMN: &str = "Size";
pub const SHORT_COLUMN: &str = "Short";
pub const LONG_COLUMN: &str = "Long";

/// A header row plus id-keyed rows.
struct Table {
    sheet: String,
    index_header: String,
    columns: Vec<String>,
    rows: Vec<(String, Vec<Data>)>,
}

impl Table {
    fn read(workbook: &mut Sheets<BufReader<File>>, sheet: &str) -> Result<Self> {
        if !workbook.sheet_names().iter().any(|s| s == sheet) {
            return Err(Error::MissingSheet {
                sheet: sheet.to_string(),
            });
        }
        let range = workbook.worksheet_range(sheet)?;
        let mut rows = range.rows();
        let header = rows.next().ok_or_else(|| Error::EmptySheet {
            sheet: sheet.to_string(),
        })?;
        let index_header = header.first().map(cell_text).unwrap_or_default();
        let columns = header.iter().skip(1).map(cell_text).collect();

        // 1-based sheet row of the first data row.
        let first_row = range.start().map_or(0, |(r, _)| r as usize) + 2;

        let mut seen = HashSet::new();
        let mut out = Vec::new();
        for (offset, row) in rows.enumerate() {
            let Some(id_cell) = row.first() else { continue };
            let id = cell_text(id_cell);
            if id.is_empty() {
                // Blank rows are layout; a row with data but no id is a typo.
                if row.iter().skip(1).all(|c| cell_text(c).is_empty()) {
                    continue;
                }
                return Err(Error::MissingId {
                    sheet: sheet.to_string(),
                    row: first_row + offset,
                });
            }
            if !seen.insert(id.clone()) {
                return Err(Error::DuplicateId {
                    sheet: sheet.to_string(),
                    id,
                });
            }
            out.push((id, row.iter().skip(1).cloned().collect()));
        }
        if out.is_empty() {
            return Err(Error::EmptySheet {
                sheet: sheet.to_string(),
            });
        }
        debug!(sheet, rows = out.len(), "read sheet");
        Ok(Self {
            sheet: sheet.to_string(),
            index_header,
            columns,
            rows: out,
        })
    }

    fn column(&self, name: &str) -> Result<usize> {
        self.columns
            .iter()
            .position(|c| c == name)
            .ok_or_else(|| Error::MissingColumn {
                sheet: self.sheet.clone(),
                column: name.to_string(),
            })
    }

    fn number(&self, id: &str, cells: &[Data], col: usize) -> Result<f64> {
        let cell = cells.get(col).unwrap_or(&Data::Empty);
        cell_number(cell).ok_or_else(|| Error::InvalidValue {
            sheet: self.sheet.clone(),
            id: id.to_string(),
            column: self.columns[col].clone(),
            value: cell_text(cell),
        })
    }
}

fn cell_text(cell: &Data) -> String {
    match cell {
        Data::Empty => String::new(),
        Data::String(s) => s.trim().to_string(),
        other => other.to_string(),
    }
}

fn cell_number(cell: &Data) -> Option<f64> {
    let v = match cell {
        Data::Int(i) => *i as f64,
        Data::Float(f) => *f,
        Data::String(s) => s.trim().parse().ok()?,
        _ => return None,
    };
    v.is_finite().then_some(v)
}

/// Load and cross-check the group schema and subject roster.
pub fn load(path: &Path) -> Result<(GroupSchema, Roster)> {
    let mut workbook = open_workbook_auto(path)?;
    let group = Table::read(&mut workbook, GROUP_SHEET)?;
    let size = Table::read(&mut workbook, SIZE_SHEET)?;

    let target = group.column(SIZE_COLUMN)?;
    let mut specs = Vec::with_capacity(group.rows.len());
    for (name, cells) in &group.rows {
        let n = group.number(name, cells, target)?;
        // Bounded by the roster before the cast so huge sizes cannot saturate.
        if n < 1.0 || n.fract() != 0.0 || n > size.rows.len() as f64 {
            return Err(Error::InvalidValue {
                sheet: group.sheet.clone(),
                id: name.clone(),
                column: SIZE_COLUMN.to_string(),
                value: n.to_string(),
            });
        }
        specs.push(GroupSpec::new(name.clone(), n as usize));
    }
    let schema = GroupSchema::new(specs)?;

    let short = size.column(SHORT_COLUMN)?;
    let long = size.column(LONG_COLUMN)?;
    let mut subjects = Vec::with_capacity(size.rows.len());
    for (id, cells) in &size.rows {
        subjects.push(Subject::new(
            id.clone(),
            size.number(id, cells, short)?,
            size.number(id, cells, long)?,
        ));
    }
    let roster = Roster::new(size.index_header.clone(), subjects)?;

    schema.check_fits(&roster)?;
    info!(
        path = %path.display(),
        groups = schema.len(),
        subjects = roster.len(),
        assigned = schema.total(),
        "loaded workbook"
    );
    Ok((schema, roster))
}

/// Write one sheet per group, named after the group, listing id and size.
pub fn write_grouping(
    path: &Path,
    schema: &GroupSchema,
    roster: &Roster,
    partition: &Partition,
) -> Result<()> {
    let mut workbook = rust_xlsxwriter::Workbook::new();
    for (spec, members) in schema.groups().iter().zip(partition.groups()) {
        let sheet = workbook.add_worksheet();
        sheet.set_name(spec.name.as_str())?;
        sheet.write_string(0, 0, roster.id_header())?;
        sheet.write_string(0, 1, SIZE_COLUMN)?;
        for (row, &idx) in members.iter().enumerate() {
            let subject = &roster.subjects()[idx];
            let row = row as u32 + 1;
            sheet.write_string(row, 0, subject.id.as_str())?;
            sheet.write_number(row, 1, subject.size())?;
        }
    }
    workbook.save(path)?;
    info!(path = %path.display(), "wrote grouping");
    Ok(())
}
