pub mod device;
pub mod transport;

pub use device::{FidoConnector, HidApiTransport};
pub use transport::{HidConnector, HidTransport};

#[derive(Debug, thiserror::Error)]
pub enum HidError {
    #[error("HID: {0}")]
    Api(#[from] hidapi::HidError),
    #[error("No usable HID device at path: {0}")]
    UnknownPath(String),
    #[error("No FIDO device matching {vendor_id:04x}:{product_id:04x}")]
    NotFound { vendor_id: u16, product_id: u16 },
    #[error("HID I/O: {0}")]
    Io(String),
}
