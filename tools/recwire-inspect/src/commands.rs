pub mod decode;
pub mod list;
pub mod schema;
