use ffistruct_layout::LayoutError;
use miette::Diagnostic;
use thiserror::Error;

/// Errors raised while reading or writing through a view.
#[derive(Debug, Error, Diagnostic, Clone, PartialEq, Eq)]
pub enum ViewError {
    #[error(transparent)]
    #[diagnostic(transparent)]
    Layout(#[from] LayoutError),

    #[error("Unknown struct field `{name}`")]
    #[diagnostic(
        code(ffistruct_view::unknown_field),
        help("Use `contains` or `keys` to inspect the fields a record declares")
    )]
    UnknownField { name: String },

    #[error("Field `{field}` holds {expected}, cannot store a {found} value")]
    #[diagnostic(code(ffistruct_view::type_mismatch))]
    TypeMismatch {
        field: String,
        expected: &'static str,
        found: &'static str,
    },

    #[error("Field `{name}` is not an inline struct or union")]
    #[diagnostic(code(ffistruct_view::not_a_record_field))]
    NotARecordField { name: String },

    #[error("Buffer holds {found} bytes but the layout needs {expected}")]
    #[diagnostic(code(ffistruct_view::buffer_size))]
    BufferSize { expected: usize, found: usize },

    #[error("Copying {len} bytes at offset {start} overruns the {size}-byte buffer")]
    #[diagnostic(code(ffistruct_view::copy_out_of_bounds))]
    CopyOutOfBounds { start: usize, len: usize, size: usize },
}

/// Result type for view and marshaling operations.
pub type ViewResult<T> = Result<T, ViewError>;
