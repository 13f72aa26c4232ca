mod aliases;
pub mod db;
pub mod models;
mod pages;
mod tables;

pub use db::{Database, DatabaseError};
pub use tables::*;
