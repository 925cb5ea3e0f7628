use super::types::*;

/// One 64-byte wire frame. The CID is stored big-endian in place, so the
/// buffer is exactly what crosses the bus; all field access goes through
/// explicit byte offsets.
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct Frame([u8; FRAME_SIZE]);

impl Frame {
    /// Initialization frame. `total_len` describes the whole logical message,
    /// `chunk` is its first min(57, len) bytes.
    pub fn init(cid: u32, cmd: u8, total_len: u16, chunk: &[u8]) -> Frame {
        debug_assert!(chunk.len() <= INIT_DATA_SIZE);
        let mut buf = [0u8; FRAME_SIZE];
        buf[0..4].copy_from_slice(&cid.to_be_bytes());
        buf[4] = TYPE_INIT_MASK | cmd;
        buf[5] = (total_len >> 8) as u8;
        buf[6] = (total_len & 0xFF) as u8;
        buf[7..].fill(PAD_BYTE);
        buf[7..7 + chunk.len()].copy_from_slice(chunk);
        Frame(buf)
    }

    /// Continuation frame carrying up to 59 payload bytes.
    pub fn cont(cid: u32, seq: u8, chunk: &[u8]) -> Frame {
        debug_assert!(chunk.len() <= CONT_DATA_SIZE);
        let mut buf = [0u8; FRAME_SIZE];
        buf[0..4].copy_from_slice(&cid.to_be_bytes());
        buf[4] = seq & !TYPE_INIT_MASK;
        buf[5..].fill(PAD_BYTE);
        buf[5..5 + chunk.len()].copy_from_slice(chunk);
        Frame(buf)
    }

    pub fn from_report(report: &[u8; FRAME_SIZE]) -> Frame {
        Frame(*report)
    }

    /// The 65-byte output report: a leading 0x00 (un-numbered report id)
    /// followed by the frame.
    pub fn as_report(&self) -> [u8; FRAME_SIZE + 1] {
        let mut report = [0u8; FRAME_SIZE + 1];
        report[1..].copy_from_slice(&self.0);
        report
    }

    pub fn cid(&self) -> u32 {
        u32::from_be_bytes([self.0[0], self.0[1], self.0[2], self.0[3]])
    }

    /// Raw type byte: command (with init mask) or sequence number.
    pub fn cmd(&self) -> u8 {
        self.0[4]
    }

    pub fn is_init(&self) -> bool {
        self.0[4] & TYPE_INIT_MASK != 0
    }

    /// Sequence number of a continuation frame.
    pub fn masked_seq(&self) -> u8 {
        self.0[4] & !TYPE_INIT_MASK
    }

    /// Total logical message length. Only meaningful on an INIT frame.
    pub fn payload_len(&self) -> u16 {
        ((self.0[5] as u16) << 8) | self.0[6] as u16
    }

    pub fn init_data(&self) -> &[u8] {
        &self.0[7..]
    }

    pub fn cont_data(&self) -> &[u8] {
        &self.0[5..]
    }
}

/// Split one logical message into its wire frames: a single INIT frame
/// followed by ascending-sequence CONT frames until the payload is spent.
/// An empty payload still produces the INIT frame.
pub fn encode_request(cid: u32, cmd: u8, payload: &[u8]) -> Vec<Frame> {
    let first_chunk = payload.len().min(INIT_DATA_SIZE);
    let mut frames = vec![Frame::init(
        cid,
        cmd,
        payload.len() as u16,
        &payload[..first_chunk],
    )];

    let mut offset = first_chunk;
    let mut seq: u8 = 0;
    while offset < payload.len() {
        let chunk = (payload.len() - offset).min(CONT_DATA_SIZE);
        frames.push(Frame::cont(cid, seq, &payload[offset..offset + chunk]));
        offset += chunk;
        seq = seq.wrapping_add(1);
    }

    frames
}
