pub mod normalize;
pub mod preparer;

pub use preparer::SeriesPreparer;
