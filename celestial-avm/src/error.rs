use thiserror::Error;

pub type AvmResult<T> = Result<T, AvmError>;

#[derive(Debug, Error)]
pub enum AvmError {
    #[error("Missing required AVM tag: {tag}")]
    MissingTag { tag: String },

    #[error("Malformed value for AVM tag '{tag}': {message}")]
    MalformedValue { tag: String, message: String },

    #[error("Invalid calibration: {message}")]
    InvalidCalibration { message: String },

    #[error("Unsupported coordinate frame: {frame}")]
    UnsupportedFrame { frame: String },

    #[error("No XMP packet found")]
    MissingXmp,

    #[error("XMP parsing error: {0}")]
    XmpParse(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl AvmError {
    pub fn missing_tag(tag: impl Into<String>) -> Self {
        Self::MissingTag { tag: tag.into() }
    }

    pub fn malformed_value(tag: impl Into<String>, message: impl Into<String>) -> Self {
        Self::MalformedValue {
            tag: tag.into(),
            message: message.into(),
        }
    }

    pub fn invalid_calibration(message: impl Into<String>) -> Self {
        Self::InvalidCalibration {
            message: message.into(),
        }
    }

    pub fn unsupported_frame(frame: impl Into<String>) -> Self {
        Self::UnsupportedFrame {
            frame: frame.into(),
        }
    }

    pub fn xmp_parse(message: impl Into<String>) -> Self {
        Self::XmpParse(message.into())
    }
}
