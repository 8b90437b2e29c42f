pub mod clearer;
pub mod probe;
pub mod trimmer;

pub use clearer::{clear, clear_except, ClearReport};
pub use probe::measure;
pub use trimmer::{trim, trim_except, FileRecord, TrimReport};
