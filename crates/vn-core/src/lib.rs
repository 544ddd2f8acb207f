pub mod ast;
pub mod error;
pub mod types;
pub mod value;

pub use ast::*;
pub use error::{ErrorKind, VnError};
pub use types::*;
pub use value::*;
