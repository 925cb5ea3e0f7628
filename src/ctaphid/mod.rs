pub mod assembly;
pub mod packet;
pub mod session;
pub mod status;
pub mod types;

pub use session::{Capabilities, CborResponse, Channel, Session};
pub use status::{Ctap2Code, StatusByte};

use types::*;

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum CtapHidError {
    #[error("Invalid command")]
    InvalidCommand,
    #[error("Invalid parameter")]
    InvalidParameter,
    #[error("Invalid length")]
    InvalidLength,
    #[error("Bad sequence number")]
    InvalidSeq,
    #[error("Receive timeout")]
    Timeout,
    #[error("Channel busy")]
    ChannelBusy,
    #[error("Channel lock required")]
    LockRequired,
    #[error("Invalid channel")]
    InvalidChannel,
    #[error("Unspecified status byte: {0:#04x}")]
    UnspecifiedStatus(u8),
    #[error("Transport failure")]
    Other,
}

impl CtapHidError {
    /// Decode the first payload byte of a CTAPHID_ERROR frame.
    pub fn from_wire(code: u8) -> Self {
        match code {
            ERR_INVALID_CMD => CtapHidError::InvalidCommand,
            ERR_INVALID_PAR => CtapHidError::InvalidParameter,
            ERR_INVALID_LEN => CtapHidError::InvalidLength,
            ERR_INVALID_SEQ => CtapHidError::InvalidSeq,
            ERR_TIMEOUT => CtapHidError::Timeout,
            ERR_CHANNEL_BUSY => CtapHidError::ChannelBusy,
            ERR_LOCK_REQUIRED => CtapHidError::LockRequired,
            ERR_INVALID_CHANNEL => CtapHidError::InvalidChannel,
            other => {
                if other != ERR_OTHER {
                    tracing::warn!(code = format!("{other:#04x}"), "unknown wire error code");
                }
                CtapHidError::Other
            }
        }
    }
}
