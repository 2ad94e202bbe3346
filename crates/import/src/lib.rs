pub mod chunk;
pub mod error;
pub mod resolve;
pub mod text;
pub mod validate;

pub use chunk::{chunk_by_sentinel, chunk_fixed};
pub use error::ImportError;
pub use resolve::resolve_category;
pub use text::{clean_amount_token, clean_lines, parse_yen};
pub use validate::{
    skip_header_block, validate_no_total_row, validate_numeric_column, validate_section_header,
    TOTAL_MARKER,
};
