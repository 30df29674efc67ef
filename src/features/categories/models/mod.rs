mod category;

pub use category::ReportCategory;
