pub mod arn;
pub mod changes;
pub mod types;

#[cfg(test)]
mod changes_tests;

pub use arn::table_name;
pub use changes::changes;
pub use types::*;
