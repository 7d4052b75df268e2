pub mod events;
pub mod interval;
pub mod note;
pub mod pitch;
pub mod waveform;
