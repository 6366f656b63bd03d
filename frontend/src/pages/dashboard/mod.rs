//! Dashboard page components
//!
//! - `DashboardPage`: environment grid, stats and the add dialog
//! - `BoardState`: reducer over the environment list

mod page;
mod types;

pub use page::DashboardPage;
