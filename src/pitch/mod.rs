pub mod estimator;
pub mod input;
pub mod notes;
pub mod onset;
pub mod tracker;
