pub mod binders;
pub mod ids;
pub mod matrix;
pub mod params;
pub mod stats;

#[cfg(test)]
#[path = "../../tests/src_inline/model/tests.rs"]
mod tests;
