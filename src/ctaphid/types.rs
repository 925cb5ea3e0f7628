pub const BROADCAST_CID: u32 = 0xFFFF_FFFF;

/// Bit 7 of the type byte distinguishes initialization from continuation
/// frames; initialization commands carry it on the wire.
pub const TYPE_INIT_MASK: u8 = 0x80;

pub const CMD_PING: u8 = TYPE_INIT_MASK | 0x01;
pub const CMD_MSG: u8 = TYPE_INIT_MASK | 0x03;
pub const CMD_LOCK: u8 = TYPE_INIT_MASK | 0x04;
pub const CMD_INIT: u8 = TYPE_INIT_MASK | 0x06;
pub const CMD_WINK: u8 = TYPE_INIT_MASK | 0x08;
pub const CMD_CBOR: u8 = TYPE_INIT_MASK | 0x10;
pub const CMD_CANCEL: u8 = TYPE_INIT_MASK | 0x11;
pub const CMD_KEEPALIVE: u8 = TYPE_INIT_MASK | 0x3B;
pub const CMD_SYNC: u8 = TYPE_INIT_MASK | 0x3C;
pub const CMD_ERROR: u8 = TYPE_INIT_MASK | 0x3F;

pub const FRAME_SIZE: usize = 64;
pub const INIT_DATA_SIZE: usize = 57;
pub const CONT_DATA_SIZE: usize = 59;
/// One INIT frame plus 128 CONT frames: 57 + 128 * 59.
pub const MAX_MESSAGE_SIZE: usize = 7609;
pub const INIT_NONCE_SIZE: usize = 8;
pub const INIT_RESPONSE_SIZE: usize = 17;

/// Unused trailing bytes of every data region are filled with this value.
pub const PAD_BYTE: u8 = 0xEE;

pub const CAP_WINK: u8 = 0x01;
pub const CAP_CBOR: u8 = 0x04;
pub const CAP_NMSG: u8 = 0x08;

pub const KEEPALIVE_PROCESSING: u8 = 0x01;
pub const KEEPALIVE_UP_NEEDED: u8 = 0x02;

pub const ERR_INVALID_CMD: u8 = 0x01;
pub const ERR_INVALID_PAR: u8 = 0x02;
pub const ERR_INVALID_LEN: u8 = 0x03;
pub const ERR_INVALID_SEQ: u8 = 0x04;
pub const ERR_TIMEOUT: u8 = 0x05;
pub const ERR_CHANNEL_BUSY: u8 = 0x06;
pub const ERR_LOCK_REQUIRED: u8 = 0x0A;
pub const ERR_INVALID_CHANNEL: u8 = 0x0B;
pub const ERR_OTHER: u8 = 0x7F;
