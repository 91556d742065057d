use miette::Diagnostic;
use thiserror::Error;

/// Errors raised while configuring the codec or computing layouts.
#[derive(Debug, Error, Diagnostic, Clone, PartialEq, Eq)]
pub enum LayoutError {
    #[error("Struct codec is not configured")]
    #[diagnostic(
        code(ffistruct_layout::not_configured),
        help("Call `ffistruct_layout::configure` once before computing layouts or instantiating records")
    )]
    NotConfigured,

    #[error("Invalid pack width {0}")]
    #[diagnostic(
        code(ffistruct_layout::invalid_pack_width),
        help("The pack width must be 1, 2, 4 or 8 bytes")
    )]
    InvalidPackWidth(u64),

    #[error("Layout of {kind} does not fit in the address space")]
    #[diagnostic(
        code(ffistruct_layout::size_overflow),
        help("Check the declared lengths of fixed arrays")
    )]
    SizeOverflow { kind: &'static str },

    #[error("Expected a struct or union at the top level, found {kind}")]
    #[diagnostic(code(ffistruct_layout::not_a_record))]
    NotARecord { kind: &'static str },
}

/// Result type for layout and configuration operations.
pub type LayoutResult<T> = Result<T, LayoutError>;
