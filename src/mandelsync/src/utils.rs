mod serde;
pub use serde::*;
