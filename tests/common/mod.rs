#![allow(dead_code)]

use std::path::PathBuf;

use rust_xlsxwriter::Workbook;

pub fn unique_path(name: &str) -> PathBuf {
    let mut path = std::env::temp_dir();
    path.push(format!(
        "groupbalance_{}_{}_{}",
        std::process::id(),
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .unwrap()
            .as_nanos(),
        name
    ));
    path
}

/// Group rows `(name, size)` and subject rows `(id, short, long)`.
pub struct Fixture<'a> {
    pub groups: Option<&'a [(&'a str, f64)]>,
    pub subjects: Option<&'a [(&'a str, f64, f64)]>,
    pub size_headers: &'a [&'a str],
}

impl<'a> Fixture<'a> {
    pub fn new(groups: &'a [(&'a str, f64)], subjects: &'a [(&'a str, f64, f64)]) -> Self {
        Self {
            groups: Some(groups),
            subjects: Some(subjects),
            size_headers: &["Mouse", "Short", "Long"],
        }
    }

    pub fn write(&self, name: &str) -> PathBuf {
        let path = unique_path(name);
        let mut wb = Workbook::new();
        if let Some(groups) = self.groups {
            let ws = wb.add_worksheet();
            ws.set_name("Group").unwrap();
            ws.write_string(0, 0, "Group").unwrap();
            ws.write_string(0, 1, "Size").unwrap();
            for (i, (name, size)) in groups.iter().enumerate() {
                let row = i as u32 + 1;
                ws.write_string(row, 0, *name).unwrap();
                ws.write_number(row, 1, *size).unwrap();
            }
        }
        if let Some(subjects) = self.subjects {
            let ws = wb.add_worksheet();
            ws.set_name("Size").unwrap();
            for (col, header) in self.size_headers.iter().enumerate() {
                ws.write_string(0, col as u16, *header).unwrap();
            }
            for (i, (id, short, long)) in subjects.iter().enumerate() {
                let row = i as u32 + 1;
                ws.write_string(row, 0, *id).unwrap();
                ws.write_number(row, 1, *short).unwrap();
                if self.size_headers.len() > 2 {
                    ws.write_number(row, 2, *long).unwrap();
                }
            }
        }
        if self.groups.is_none() && self.subjects.is_none() {
            wb.add_worksheet().set_name("Other").unwrap();
        }
        wb.save(&path).unwrap();
        path
    }
}

pub fn mice(n: usize) -> Vec<(String, f64, f64)> {
    (0..n)
        .map(|i| (format!("M{:02}", i + 1), 3.0 + (i % 5) as f64, 4.0 + (i % 7) as f64 * 0.5))
        .collect()
}

pub fn as_rows(mice: &[(String, f64, f64)]) -> Vec<(&str, f64, f64)> {
    mice.iter().map(|(id, s, l)| (id.as_str(), *s, *l)).collect()
}
