mod category_handler;

pub use category_handler::{__path_list_categories, list_categories};
