use std::ffi::CString;
use std::thread;
use std::time::Duration;

use hidapi::{HidApi, HidDevice};

use super::transport::{HidConnector, HidTransport};
use super::HidError;

/// Usage page the FIDO Alliance registered for CTAP devices.
pub const FIDO_USAGE_PAGE: u16 = 0xF1D0;

const DEVICE_RETRIES: u32 = 10;
const RETRY_STEP: Duration = Duration::from_millis(100);

/// An opened hidapi handle.
pub struct HidApiTransport {
    dev: HidDevice,
}

impl HidTransport for HidApiTransport {
    fn write_report(&mut self, report: &[u8]) -> Result<usize, HidError> {
        Ok(self.dev.write(report)?)
    }

    fn read_report(&mut self, buf: &mut [u8], timeout_ms: i32) -> Result<usize, HidError> {
        Ok(self.dev.read_timeout(buf, timeout_ms)?)
    }
}

/// Re-resolves and opens a security key by the identifiers it was first
/// seen with.
pub struct FidoConnector {
    api: HidApi,
    vendor_id: u16,
    product_id: u16,
}

impl FidoConnector {
    /// Bind to the key currently visible at `path`, remembering its vendor
    /// and product ids so the device can be found again after it
    /// re-enumerates at a different path.
    pub fn from_path(path: &str) -> Result<Self, HidError> {
        let api = HidApi::new()?;
        let identifiers = api
            .device_list()
            .find(|info| info.path().to_string_lossy() == path)
            .map(|info| (info.vendor_id(), info.product_id()))
            .filter(|&(vid, pid)| vid != 0 && pid != 0)
            .ok_or_else(|| HidError::UnknownPath(path.to_owned()))?;
        Ok(FidoConnector {
            api,
            vendor_id: identifiers.0,
            product_id: identifiers.1,
        })
    }

    pub fn vendor_id(&self) -> u16 {
        self.vendor_id
    }

    pub fn product_id(&self) -> u16 {
        self.product_id
    }

    /// Current path of the first interface of our device on the FIDO usage
    /// page. Linear backoff: attempt i waits 100*i ms first, so the first
    /// attempt does not wait at all.
    fn find_device_path(&mut self) -> Result<CString, HidError> {
        for attempt in 0..DEVICE_RETRIES {
            thread::sleep(RETRY_STEP * attempt);
            if attempt > 0 {
                self.api.refresh_devices()?;
            }
            let found = self.api.device_list().find(|info| {
                info.vendor_id() == self.vendor_id
                    && info.product_id() == self.product_id
                    && info.usage_page() == FIDO_USAGE_PAGE
            });
            if let Some(info) = found {
                return Ok(info.path().to_owned());
            }
            tracing::debug!(attempt, "device not present yet");
        }
        Err(HidError::NotFound {
            vendor_id: self.vendor_id,
            product_id: self.product_id,
        })
    }
}

impl HidConnector for FidoConnector {
    type Transport = HidApiTransport;

    fn connect(&mut self) -> Result<HidApiTransport, HidError> {
        let path = self.find_device_path()?;
        let dev = self.api.open_path(&path)?;
        tracing::info!(path = path.to_string_lossy().into_owned(), "opened FIDO device");
        Ok(HidApiTransport { dev })
    }
}
