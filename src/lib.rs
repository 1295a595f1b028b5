pub mod cli;
pub mod codec;
pub mod config;
pub mod data_types;
pub mod format;
pub mod pagination;
pub mod resolver;
pub mod store;

extern crate lazy_static;

#[cfg(test)]
pub(crate) mod testutils;
