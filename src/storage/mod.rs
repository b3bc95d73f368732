pub mod document;
pub mod sheet;

pub use document::Document;
pub use sheet::Sheet;
