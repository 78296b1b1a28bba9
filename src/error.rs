//! Error taxonomy for loading, searching and reporting.
//!
//! Every failure is terminal for a run; the binary prints the message and
//! exits non-zero.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    #[error("cannot open workbook: {0}")]
    Workbook(#[from] calamine::Error),

    #[error("cannot find the {sheet} information")]
    MissingSheet { sheet: String },

    #[error("sheet `{sheet}` has no data rows")]
    EmptySheet { sheet: String },

    #[error("sheet `{sheet}`, row {row}: values without an id")]
    MissingId { sheet: String, row: usize },

    #[error("sheet `{sheet}` lists id `{id}` more than once")]
    DuplicateId { sheet: String, id: String },

    #[error("sheet `{sheet}` is missing required column `{column}`")]
    MissingColumn { sheet: String, column: String },

    #[error("sheet `{sheet}`, id `{id}`: column `{column}` has invalid value `{value}`")]
    InvalidValue {
        sheet: String,
        id: String,
        column: String,
        value: String,
    },

    #[error("group schema is empty")]
    EmptySchema,

    #[error("groups request {requested} subjects but only {available} are available")]
    GroupSizeExceedsRoster { requested: usize, available: usize },

    #[error(
        "no candidate out of {iterations} has every pairwise p-value above {threshold}; \
         try more iterations or a lower threshold"
    )]
    NoBalancedCandidate { threshold: f64, iterations: usize },

    #[error("cannot write grouping workbook: {0}")]
    Export(#[from] rust_xlsxwriter::XlsxError),

    #[error("cannot render plots: {0}")]
    Plot(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("invalid configuration: {0}")]
    Config(String),
}
