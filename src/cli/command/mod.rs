pub mod inspect;
pub mod preprocess;

pub use inspect::inspect;
pub use preprocess::preprocess;
