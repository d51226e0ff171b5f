// Audio containers and raw sample buffers

pub mod wav;

pub use wav::{decode, encode, AudioFormat, RawAudioBuffer, WAV_HEADER_LEN};
