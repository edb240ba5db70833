pub mod document;
pub mod enums;
pub(crate) mod lenient;
pub mod record;

pub use document::*;
pub use enums::*;
pub use record::*;

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Invalid enum value for {field}: {value}")]
pub struct ParseEnumError {
    pub field: String,
    pub value: String,
}
