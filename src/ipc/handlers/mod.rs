pub mod assignments;
pub mod auth;
pub mod classes;
pub mod core;
pub mod levels;
pub mod records;
pub mod reports;
pub mod students;
pub mod test_items;
pub mod users;
