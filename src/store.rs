pub mod default;
pub mod dialect;
pub mod interface;
#[cfg(feature = "store-postgres")]
pub mod postgres;
pub mod sqlite;
pub mod value;
