pub mod feedback;
pub mod state;
