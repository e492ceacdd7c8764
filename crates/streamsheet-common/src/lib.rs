pub mod error;
pub mod index;
pub mod value;

pub use error::*;
pub use index::*;
pub use value::*;
