pub mod tenant;
pub mod usecase;
