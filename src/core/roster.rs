//! Subjects, the group schema, and the checks that tie them together.

use std::collections::HashSet;

use crate::error::{Error, Result};

/// Default header for the subject id column when the sheet leaves it blank.
pub const DEFAULT_ID_HEADER: &str = "Subject";

#[derive(Clone, Debug, PartialEq)]
pub struct Subject {
    pub id: String,
    pub short: f64,
    pub long: f64,
}

impl Subject {
    pub fn new(id: impl Into<String>, short: f64, long: f64) -> Self {
        Self {
            id: id.into(),
            short,
            long,
        }
    }

    /// Area proxy: product of the two measured dimensions.
    pub fn size(&self) -> f64 {
        self.short * self.long
    }
}

/// Subjects in sheet order, ids unique.
#[derive(Clone, Debug)]
pub struct Roster {
    id_header: String,
    subjects: Vec<Subject>,
}

impl Roster {
    pub fn new(id_header: impl Into<String>, subjects: Vec<Subject>) -> Result<Self> {
        let mut seen = HashSet::with_capacity(subjects.len());
        for s in &subjects {
            if !seen.insert(s.id.as_str()) {
                return Err(Error::DuplicateId {
                    sheet: "Size".to_string(),
                    id: s.id.clone(),
                });
            }
        }
        let id_header = id_header.into();
        let id_header = if id_header.trim().is_empty() {
            DEFAULT_ID_HEADER.to_string()
        } else {
            id_header
        };
        Ok(Self {
            id_header,
            subjects,
        })
    }

    /// Roster whose sizes are given directly (short = size, long = 1).
    pub fn from_sizes(sizes: &[f64]) -> Self {
        let subjects = sizes
            .iter()
            .enumerate()
            .map(|(i, &s)| Subject::new(format!("S{}", i + 1), s, 1.0))
            .collect();
        Self {
            id_header: DEFAULT_ID_HEADER.to_string(),
            subjects,
        }
    }

    pub fn id_header(&self) -> &str {
        &self.id_header
    }

    pub fn subjects(&self) -> &[Subject] {
        &self.subjects
    }

    pub fn len(&self) -> usize {
        self.subjects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.subjects.is_empty()
    }

    pub fn sizes(&self) -> Vec<f64> {
        self.subjects.iter().map(Subject::size).collect()
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GroupSpec {
    pub name: String,
    pub size: usize,
}

impl GroupSpec {
    pub fn new(name: impl Into<String>, size: usize) -> Self {
        Self {
            name: name.into(),
            size,
        }
    }
}

/// Ordered target groups. Names unique, every size at least one.
#[derive(Clone, Debug)]
pub struct GroupSchema {
    groups: Vec<GroupSpec>,
}

impl GroupSchema {
    pub fn new(groups: Vec<GroupSpec>) -> Result<Self> {
        if groups.is_empty() {
            return Err(Error::EmptySchema);
        }
        let mut seen = HashSet::with_capacity(groups.len());
        for g in &groups {
            if !seen.insert(g.name.as_str()) {
                return Err(Error::DuplicateId {
                    sheet: "Group".to_string(),
                    id: g.name.clone(),
                });
            }
            if g.size == 0 {
                return Err(Error::InvalidValue {
                    sheet: "Group".to_string(),
                    id: g.name.clone(),
                    column: "Size".to_string(),
                    value: "0".to_string(),
                });
            }
        }
        Ok(Self { groups })
    }

    pub fn groups(&self) -> &[GroupSpec] {
        &self.groups
    }

    pub fn len(&self) -> usize {
        self.groups.len()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    /// Number of subjects a partition assigns. Saturates at `usize::MAX`, which
    /// no roster can satisfy.
    pub fn total(&self) -> usize {
        self.groups
            .iter()
            .try_fold(0usize, |acc, g| acc.checked_add(g.size))
            .unwrap_or(usize::MAX)
    }

    pub fn check_fits(&self, roster: &Roster) -> Result<()> {
        let requested = self.total();
        if requested > roster.len() {
            return Err(Error::GroupSizeExceedsRoster {
                requested,
                available: roster.len(),
            });
        }
        Ok(())
    }
}
