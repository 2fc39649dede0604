//! Site-specific page parsers

pub mod cerny_rytir;

pub use cerny_rytir::CatalogParser;
