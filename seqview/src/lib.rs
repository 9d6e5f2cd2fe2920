pub mod crop;
pub mod image;
pub mod sequence;
