mod error;
mod hexaddr;

pub use error::{err, Error, Result};
pub use hexaddr::{encode, is_hex};
