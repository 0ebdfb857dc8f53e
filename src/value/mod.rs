//! Document values: an owned, reference-counted tree of scalars, arrays and maps.

mod convert;
mod core;
mod instance;

pub(crate) use self::core::UNDEFINED;
pub use self::core::{Map, Value};
pub use instance::{Constructor, Instance, RegexValue};
