pub mod backend;
pub mod reports;
pub mod tester;

pub use tester::*;
