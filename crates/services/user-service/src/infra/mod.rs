//! Infrastructure layer.

mod db;

pub use db::Database;
