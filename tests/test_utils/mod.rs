pub mod fixtures;

pub use fixtures::{Captured, captured, captured_with, label};
