pub mod commands;
pub mod options;
pub mod output;
pub mod scaffold;

pub use commands::*;
pub use options::*;
pub use output::*;
pub use scaffold::*;
