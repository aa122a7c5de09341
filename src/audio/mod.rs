// Audio subsystem: capture stream, ring buffer, WAV collaborator

pub mod capture;
pub mod ring_buffer;
pub mod wav;

pub use capture::CaptureStream;
pub use ring_buffer::RingBuffer;
