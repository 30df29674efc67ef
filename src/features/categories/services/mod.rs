mod category_service;

pub use category_service::{CategoryCatalog, CategoryService};

#[cfg(test)]
pub use category_service::StaticCategoryCatalog;
