pub mod model;

pub use model::{load_macros, load_program, Input};
