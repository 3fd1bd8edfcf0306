pub mod command;
pub mod error;
pub mod return_value;
pub mod types;

pub use command::*;
pub use error::{CompilerFault, ErrorArray, ErrorToken};
pub use return_value::*;
pub use types::*;
