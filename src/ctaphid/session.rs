use std::time::{Duration, Instant};

use rand::{rngs::StdRng, Rng, SeedableRng};

use super::{
    assembly::{Assembler, Message, Progress},
    packet::{encode_request, Frame},
    status::{Ctap2Code, StatusByte},
    types::*,
    CtapHidError,
};
use crate::hid::{HidConnector, HidTransport};
use crate::up::{StdoutPrompt, UserPresencePrompt};

/// Receive budget for one logical message, and for each candidate frame
/// inside the handshake and keepalive loops.
pub const RECEIVE_TIMEOUT: Duration = Duration::from_millis(5000);

/// Nonces come from a seeded generator so test runs are reproducible.
const DEFAULT_NONCE_SEED: u64 = 0;

/// Channel the session transmits on. Broadcast until the handshake assigns
/// a real id, so the two cannot be confused after that point.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Channel {
    Broadcast,
    Assigned(u32),
}

impl Channel {
    pub fn id(self) -> u32 {
        match self {
            Channel::Broadcast => BROADCAST_CID,
            Channel::Assigned(cid) => cid,
        }
    }
}

/// Capability bits from byte 16 of the handshake response. NMSG is a
/// negative flag on the wire; it is inverted here once at decode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Capabilities {
    pub wink: bool,
    pub cbor: bool,
    pub msg: bool,
}

impl Capabilities {
    pub fn decode(byte: u8) -> Self {
        Capabilities {
            wink: byte & CAP_WINK != 0,
            cbor: byte & CAP_CBOR != 0,
            msg: byte & CAP_NMSG == 0,
        }
    }
}

/// Terminal result of a CBOR exchange: the CTAP2 status byte and the
/// response CBOR that followed it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CborResponse {
    pub status: Ctap2Code,
    pub cbor: Vec<u8>,
}

enum Keepalive {
    Processing,
    UpNeeded,
}

/// One binding to a security key. Exclusively owns the device handle; the
/// handle is opened by `init` and closed on drop or on the next `init`.
pub struct Session<C: HidConnector> {
    connector: C,
    transport: Option<C::Transport>,
    channel: Channel,
    capabilities: Option<Capabilities>,
    can_wink: Option<bool>,
    rng: StdRng,
    prompt: Box<dyn UserPresencePrompt>,
    verbose: bool,
}

impl<C: HidConnector> Session<C> {
    pub fn new(connector: C) -> Self {
        Self::with_seed(connector, DEFAULT_NONCE_SEED)
    }

    pub fn with_seed(connector: C, seed: u64) -> Self {
        Session {
            connector,
            transport: None,
            channel: Channel::Broadcast,
            capabilities: None,
            can_wink: None,
            rng: StdRng::seed_from_u64(seed),
            prompt: Box::new(StdoutPrompt),
            verbose: false,
        }
    }

    /// Enable per-frame hex dumps at debug level.
    pub fn verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    pub fn with_prompt(mut self, prompt: Box<dyn UserPresencePrompt>) -> Self {
        self.prompt = prompt;
        self
    }

    pub fn connector(&self) -> &C {
        &self.connector
    }

    pub fn channel(&self) -> Channel {
        self.channel
    }

    pub fn capabilities(&self) -> Option<Capabilities> {
        self.capabilities
    }

    /// Observed WINK behavior, recorded by `wink`.
    pub fn can_wink(&self) -> Option<bool> {
        self.can_wink
    }

    /// Allocate a channel: open the device, send an INIT challenge on the
    /// broadcast channel and wait for the nonce echo. Any previously open
    /// handle is closed first; a failed handshake closes the new one too.
    pub fn init(&mut self) -> Result<(), CtapHidError> {
        self.transport = None;
        self.channel = Channel::Broadcast;
        self.capabilities = None;

        let transport = self.connector.connect().map_err(|e| {
            tracing::warn!("device open failed: {e}");
            CtapHidError::Other
        })?;
        self.transport = Some(transport);

        match self.handshake() {
            Ok(()) => Ok(()),
            Err(e) => {
                self.transport = None;
                Err(e)
            }
        }
    }

    fn handshake(&mut self) -> Result<(), CtapHidError> {
        let mut nonce = [0u8; INIT_NONCE_SIZE];
        self.rng.fill(&mut nonce[..]);

        let challenge = Frame::init(BROADCAST_CID, CMD_INIT, INIT_NONCE_SIZE as u16, &nonce);
        self.send_frame(&challenge)?;

        loop {
            // Frames from other channels are expected on a shared bus; each
            // candidate gets a fresh budget.
            let response = self.receive_frame(Instant::now() + RECEIVE_TIMEOUT)?;
            if response.cid() != BROADCAST_CID
                || response.cmd() != CMD_INIT
                || response.payload_len() as usize != INIT_RESPONSE_SIZE
                || response.init_data()[..INIT_NONCE_SIZE] != nonce
            {
                continue;
            }

            let data = response.init_data();
            let cid = u32::from_be_bytes([data[8], data[9], data[10], data[11]]);
            self.channel = Channel::Assigned(cid);
            self.capabilities = Some(Capabilities::decode(data[16]));
            tracing::info!(
                cid = format!("{cid:#010x}"),
                capabilities = format!("{:#04x}", data[16]),
                "channel assigned"
            );
            return Ok(());
        }
    }

    /// Round-trip an arbitrary payload; the key must echo it unchanged.
    pub fn ping(&mut self, payload: &[u8]) -> Result<(), CtapHidError> {
        self.send_command(CMD_PING, payload)?;
        let reply = self.receive_command(RECEIVE_TIMEOUT)?;
        if reply.cmd != CMD_PING {
            return Err(CtapHidError::InvalidCommand);
        }
        if reply.payload != payload {
            tracing::warn!("PING reply does not match the sent payload");
            return Err(CtapHidError::Other);
        }
        Ok(())
    }

    /// Ask the key to identify itself visually. Records whether the command
    /// actually worked, independent of the advertised capability bit.
    pub fn wink(&mut self) -> Result<(), CtapHidError> {
        self.can_wink = Some(false);
        self.send_command(CMD_WINK, &[])?;
        let reply = self.receive_command(RECEIVE_TIMEOUT)?;
        if reply.cmd != CMD_WINK {
            return Err(CtapHidError::InvalidCommand);
        }
        if !reply.payload.is_empty() {
            return Err(CtapHidError::InvalidLength);
        }
        self.can_wink = Some(true);
        Ok(())
    }

    /// Encapsulated CTAP1/U2F message; the response payload is returned
    /// verbatim.
    pub fn msg(&mut self, payload: &[u8]) -> Result<Vec<u8>, CtapHidError> {
        self.send_command(CMD_MSG, payload)?;
        let reply = self.receive_command(RECEIVE_TIMEOUT)?;
        if reply.cmd != CMD_MSG {
            return Err(CtapHidError::InvalidCommand);
        }
        Ok(reply.payload)
    }

    /// Hold the channel lock for up to `seconds` (0 releases it).
    pub fn lock(&mut self, seconds: u8) -> Result<(), CtapHidError> {
        self.send_command(CMD_LOCK, &[seconds])?;
        let reply = self.receive_command(RECEIVE_TIMEOUT)?;
        if reply.cmd != CMD_LOCK {
            return Err(CtapHidError::InvalidCommand);
        }
        if !reply.payload.is_empty() {
            return Err(CtapHidError::InvalidLength);
        }
        Ok(())
    }

    pub fn sync(&mut self) -> Result<(), CtapHidError> {
        self.send_command(CMD_SYNC, &[])?;
        let reply = self.receive_command(RECEIVE_TIMEOUT)?;
        if reply.cmd != CMD_SYNC {
            return Err(CtapHidError::InvalidCommand);
        }
        Ok(())
    }

    /// Abort the outstanding request on this channel. Fire-and-forget; the
    /// response (if any) arrives as the aborted request's error.
    pub fn cancel(&mut self) -> Result<(), CtapHidError> {
        self.send_command(CMD_CANCEL, &[])
    }

    /// One CTAP2 request/response round-trip: the command byte is prefixed
    /// to the CBOR payload, keepalives are consumed (prompting the user at
    /// most once when presence is requested), and the terminal status byte
    /// is classified.
    pub fn exchange_cbor(
        &mut self,
        command: u8,
        payload: &[u8],
        expect_up_check: bool,
    ) -> Result<CborResponse, CtapHidError> {
        // Status byte + payload must fit the frame budget.
        if 1 + payload.len() > MAX_MESSAGE_SIZE {
            return Err(CtapHidError::InvalidLength);
        }
        let mut request = Vec::with_capacity(1 + payload.len());
        request.push(command);
        request.extend_from_slice(payload);
        self.send_command(CMD_CBOR, &request)?;

        let mut reply = self.receive_command(RECEIVE_TIMEOUT)?;

        let mut has_sent_prompt = false;
        while reply.cmd == CMD_KEEPALIVE {
            match self.process_keepalive(&reply.payload)? {
                Keepalive::Processing => {}
                Keepalive::UpNeeded => {
                    if !has_sent_prompt {
                        has_sent_prompt = true;
                        self.prompt.prompt_touch();
                    }
                }
            }
            reply = self.receive_command(RECEIVE_TIMEOUT)?;
        }

        if reply.cmd != CMD_CBOR {
            return Err(CtapHidError::InvalidCommand);
        }
        if reply.payload.is_empty() {
            return Err(CtapHidError::InvalidLength);
        }

        if has_sent_prompt && !expect_up_check {
            tracing::warn!("a user presence prompt was sent unexpectedly");
        }
        if !has_sent_prompt && expect_up_check {
            tracing::warn!(
                "a prompt was expected but not performed; a fast touch is sometimes not recognized"
            );
        }

        let status = match StatusByte::classify(reply.payload[0]) {
            StatusByte::Standard(code) => code,
            StatusByte::Retired(byte) => {
                tracing::warn!(
                    byte = format!("{byte:#04x}"),
                    "received deprecated error code"
                );
                return Err(CtapHidError::Other);
            }
            StatusByte::Extension(byte) => {
                tracing::warn!(
                    byte = format!("{byte:#04x}"),
                    "received extension specific error code"
                );
                return Err(CtapHidError::Other);
            }
            StatusByte::Vendor(byte) => {
                tracing::warn!(
                    byte = format!("{byte:#04x}"),
                    "received vendor specific error code"
                );
                return Err(CtapHidError::Other);
            }
            StatusByte::Unknown(byte) => {
                return Err(CtapHidError::UnspecifiedStatus(byte));
            }
        };

        Ok(CborResponse {
            status,
            cbor: reply.payload[1..].to_vec(),
        })
    }

    fn process_keepalive(&self, payload: &[u8]) -> Result<Keepalive, CtapHidError> {
        if payload.len() != 1 {
            return Err(CtapHidError::Other);
        }
        match payload[0] {
            KEEPALIVE_PROCESSING => {
                tracing::debug!("keepalive: key is still processing");
                Ok(Keepalive::Processing)
            }
            KEEPALIVE_UP_NEEDED => {
                tracing::debug!("keepalive: user interaction is needed");
                Ok(Keepalive::UpNeeded)
            }
            byte => {
                tracing::warn!(byte = format!("{byte:#04x}"), "unknown keepalive status");
                Err(CtapHidError::Other)
            }
        }
    }

    /// Fragment one logical message onto the session channel.
    pub fn send_command(&mut self, cmd: u8, data: &[u8]) -> Result<(), CtapHidError> {
        if data.len() > MAX_MESSAGE_SIZE {
            return Err(CtapHidError::InvalidLength);
        }
        for frame in encode_request(self.channel.id(), cmd, data) {
            self.send_frame(&frame)?;
        }
        Ok(())
    }

    /// Reassemble the next logical message on the session channel within
    /// `timeout`, dropping foreign-channel traffic along the way.
    pub fn receive_command(&mut self, timeout: Duration) -> Result<Message, CtapHidError> {
        let deadline = Instant::now() + timeout;
        let mut assembler = Assembler::new(self.channel.id());
        loop {
            let frame = self.receive_frame(deadline)?;
            match assembler.absorb(&frame)? {
                Progress::Complete(message) => return Ok(message),
                Progress::Pending | Progress::Ignored => {}
            }
        }
    }

    fn send_frame(&mut self, frame: &Frame) -> Result<(), CtapHidError> {
        let transport = self.transport.as_mut().ok_or(CtapHidError::Other)?;
        let report = frame.as_report();
        match transport.write_report(&report) {
            Ok(n) if n == report.len() => {
                self.log_frame(">> send >>", frame);
                Ok(())
            }
            Ok(n) => {
                tracing::warn!(written = n, "short HID write");
                Err(CtapHidError::Other)
            }
            Err(e) => {
                tracing::warn!("HID write failed: {e}");
                Err(CtapHidError::Other)
            }
        }
    }

    fn receive_frame(&mut self, deadline: Instant) -> Result<Frame, CtapHidError> {
        let remaining = deadline.saturating_duration_since(Instant::now());
        if remaining.is_zero() {
            return Err(CtapHidError::Timeout);
        }

        let transport = self.transport.as_mut().ok_or(CtapHidError::Other)?;
        let mut buf = [0u8; FRAME_SIZE];
        match transport.read_report(&mut buf, remaining.as_millis() as i32) {
            Ok(n) if n == FRAME_SIZE => {
                let frame = Frame::from_report(&buf);
                self.log_frame("<< recv <<", &frame);
                Ok(frame)
            }
            Ok(0) => {
                tracing::debug!("HID read timeout");
                Err(CtapHidError::Timeout)
            }
            Ok(n) => {
                tracing::warn!(read = n, "short HID read");
                Err(CtapHidError::Other)
            }
            Err(e) => {
                tracing::warn!("HID read failed: {e}");
                Err(CtapHidError::Other)
            }
        }
    }

    fn log_frame(&self, direction: &str, frame: &Frame) {
        if !self.verbose {
            return;
        }
        if frame.is_init() {
            tracing::debug!(
                cid = format!("{:#010x}", frame.cid()),
                cmd = format!("{:#04x}", frame.cmd()),
                len = frame.payload_len(),
                data = hex(frame.init_data()),
                "{direction}"
            );
        } else {
            tracing::debug!(
                cid = format!("{:#010x}", frame.cid()),
                seq = frame.masked_seq(),
                data = hex(frame.cont_data()),
                "{direction}"
            );
        }
    }
}

fn hex(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{b:02x}")).collect()
}
