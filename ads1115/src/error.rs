use crate::bus::BusError;
use crate::session::Step;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Error {
    #[error("configuration write failed: {0}")]
    ConfigurationWriteFailed(#[source] BusError),

    #[error("conversion register select failed: {0}")]
    RegisterSelectFailed(#[source] BusError),

    #[error("conversion result read failed: {0}")]
    ResultReadFailed(#[source] BusError),

    #[error("buffer too small: need {needed} bytes, have {available}")]
    BufferTooSmall { needed: usize, available: usize },

    #[error("could not render conversion value")]
    EncodingFailed,

    #[error("invalid request code 0x{0:08x}")]
    InvalidRequest(u32),

    #[error("device is already open")]
    Busy,

    #[error("could not release bus device: {0}")]
    Release(#[source] BusError),
}

impl Error {
    /// Protocol step that failed, if this error came out of an acquisition.
    pub fn step(&self) -> Option<Step> {
        match self {
            Error::ConfigurationWriteFailed(_) => Some(Step::Configuring),
            Error::RegisterSelectFailed(_) => Some(Step::SelectingRegister),
            Error::ResultReadFailed(_) => Some(Step::Reading),
            _ => None,
        }
    }
}
