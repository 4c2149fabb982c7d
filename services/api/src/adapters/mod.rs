pub mod catalog;
pub mod db;
pub mod memory;

pub use catalog::CatalogAdSelector;
pub use db::DbAdapter;
pub use memory::MemoryStore;
