use hidapi::HidApi;

use crate::config::Config;
use crate::ctaphid::Session;
use crate::hid::device::{FidoConnector, FIDO_USAGE_PAGE};

pub fn check(cfg: &Config) -> anyhow::Result<()> {
    let mut errors: Vec<String> = Vec::new();

    // Check 1: hidapi context can be created at all
    if let Err(e) = HidApi::new() {
        errors.push(format!(
            "cannot initialize hidapi: {e}\n  \
             → on Linux, libhidapi and libusb must be installed"
        ));
    }

    // Check 2: device node readable
    if let Some(path) = &cfg.device {
        match std::fs::OpenOptions::new().read(true).open(path) {
            Ok(_) => {}
            Err(e) => errors.push(format!(
                "cannot open {path}: {e}\n  \
                 → add a udev rule for the hidraw node, or run as a member of its group"
            )),
        }
    }

    if errors.is_empty() {
        return Ok(());
    }

    for err in &errors {
        eprintln!("ERROR: {err}");
    }
    anyhow::bail!("{} preflight check(s) failed", errors.len());
}

/// Print every HID interface on the FIDO usage page.
pub fn print_fido_devices() -> anyhow::Result<()> {
    let api = HidApi::new()?;
    for info in api
        .device_list()
        .filter(|info| info.usage_page() == FIDO_USAGE_PAGE)
    {
        println!("Found device");
        println!(
            "  VID/PID     : {:04x}:{:04x}",
            info.vendor_id(),
            info.product_id()
        );
        println!(
            "  Page/Usage  : {:#06x}/{:#06x}",
            info.usage_page(),
            info.usage()
        );
        println!(
            "  Manufacturer: {}",
            info.manufacturer_string().unwrap_or("(unknown)")
        );
        println!(
            "  Product     : {}",
            info.product_string().unwrap_or("(unknown)")
        );
        println!(
            "  S/N         : {}",
            info.serial_number().unwrap_or("(unknown)")
        );
        println!("  Path        : {}", info.path().to_string_lossy());
        println!();
    }
    Ok(())
}

/// What the key reported during the handshake, against what was observed.
pub fn print_capability_report(session: &Session<FidoConnector>) {
    let connector = session.connector();
    println!(" Vendor ID: {:#06x}", connector.vendor_id());
    println!("Product ID: {:#06x}", connector.product_id());

    if let Some(can_wink) = session.can_wink() {
        if can_wink {
            println!("The optional command WINK worked.");
        } else {
            println!("The optional command WINK did not work.");
        }
        if let Some(caps) = session.capabilities() {
            if can_wink != caps.wink {
                tracing::warn!("the reported WINK capability did not match the observed response");
            }
        }
    }

    if let Some(caps) = session.capabilities() {
        if caps.cbor {
            println!("The CBOR capability was set.");
        } else {
            println!("The CBOR capability was NOT set.");
        }
        if caps.msg {
            println!("The MSG capability was set.");
        } else {
            println!("The MSG capability was NOT set.");
        }
    }
}
