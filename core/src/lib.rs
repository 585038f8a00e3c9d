pub mod db;
pub mod importer;
pub mod journal;
pub mod models;
pub mod search;
pub mod store;
