use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Validation,
    Server,
    Transport,
}

#[derive(Debug, Error)]
pub enum CoreError {
    #[error("Please upload PDF files only")]
    UnsupportedFileType { media_type: String },
    #[error("The file is too large. Maximum 5MB")]
    FileTooLarge { size: u64 },
    #[error("Could not read {name}: {reason}")]
    FileUnreadable { name: String, reason: String },
    #[error("Please select a CV in PDF format")]
    MissingFile,
    #[error("The job offer must be longer than {min} characters")]
    OfferTooShort { min: usize },
    #[error("{detail}")]
    Server { status: u16, detail: String },
    #[error("Invalid response from the analysis service: {0}")]
    InvalidResponse(String),
    #[error("Could not connect to the analysis service: {0}")]
    Connection(String),
}

impl CoreError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            CoreError::UnsupportedFileType { .. }
            | CoreError::FileTooLarge { .. }
            | CoreError::FileUnreadable { .. }
            | CoreError::MissingFile
            | CoreError::OfferTooShort { .. } => ErrorKind::Validation,
            CoreError::Server { .. } | CoreError::InvalidResponse(_) => ErrorKind::Server,
            CoreError::Connection(_) => ErrorKind::Transport,
        }
    }
}
