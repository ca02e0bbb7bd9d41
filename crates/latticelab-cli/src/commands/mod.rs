pub mod elements;
pub mod simulate;
