pub use filter_syntax::error::{FilterError, Result};
