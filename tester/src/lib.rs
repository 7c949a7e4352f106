mod helpers;
pub mod options;
pub mod report;

pub use helpers::*;
