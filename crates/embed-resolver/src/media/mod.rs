pub mod candidate;
pub mod media_format;
pub mod stream_info;

pub use candidate::CandidateStream;
pub use media_format::{FormatHint, MediaFormat};
pub use stream_info::ExtractedStreamInfo;
