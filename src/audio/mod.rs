// Audio module - measure model, metronome voices, tone generation and output rendering

pub mod haptics;
pub mod measure;
pub mod metronome;
pub mod renderer;
pub mod tone;

// Re-export commonly used types for convenience
pub use haptics::{platform_haptics, HapticFeedback, LogHaptics};
pub use measure::{Measure, MetronomeNote, Voice, HAPTIC_MEASURE, STOP_MEASURE};
pub use renderer::{command_queue, retire_queue, OutputRenderer, RenderCommand, Steps};
pub use tone::{generate_tone, Tone};
