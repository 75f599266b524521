mod cursor;
#[cfg(test)]
pub(crate) mod encode;
mod mmap;
mod reader;

pub use cursor::ByteCursor;
pub use mmap::MappedFile;
pub use reader::{open_path, BoxedReader};
