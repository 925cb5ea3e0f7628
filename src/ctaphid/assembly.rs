use super::{packet::Frame, types::*, CtapHidError};

/// A complete logical message received on the bound channel.
#[derive(Debug)]
pub struct Message {
    /// Wire type byte of the INIT frame (command with init mask).
    pub cmd: u8,
    pub payload: Vec<u8>,
}

/// Outcome of feeding one frame to the assembler.
#[derive(Debug)]
pub enum Progress {
    Complete(Message),
    /// Frame accepted, more continuations expected.
    Pending,
    /// Foreign-channel traffic or a stray continuation; dropped without
    /// touching assembly state.
    Ignored,
}

enum State {
    AwaitInit,
    Collecting {
        cmd: u8,
        total: usize,
        data: Vec<u8>,
        next_seq: u8,
    },
}

/// Reassembles one logical message from frames on a shared bus. Bound to a
/// single channel id for its whole lifetime.
pub struct Assembler {
    cid: u32,
    state: State,
}

impl Assembler {
    pub fn new(cid: u32) -> Self {
        Assembler {
            cid,
            state: State::AwaitInit,
        }
    }

    pub fn absorb(&mut self, frame: &Frame) -> Result<Progress, CtapHidError> {
        if frame.cid() != self.cid {
            return Ok(Progress::Ignored);
        }

        match &mut self.state {
            State::AwaitInit => {
                if !frame.is_init() {
                    return Ok(Progress::Ignored);
                }
                if frame.cmd() == CMD_ERROR {
                    return Err(CtapHidError::from_wire(frame.init_data()[0]));
                }
                let total = frame.payload_len() as usize;
                if total > MAX_MESSAGE_SIZE {
                    return Err(CtapHidError::InvalidLength);
                }
                let first_chunk = total.min(INIT_DATA_SIZE);
                let mut data = Vec::with_capacity(total);
                data.extend_from_slice(&frame.init_data()[..first_chunk]);
                if data.len() == total {
                    return Ok(Progress::Complete(Message {
                        cmd: frame.cmd(),
                        payload: data,
                    }));
                }
                self.state = State::Collecting {
                    cmd: frame.cmd(),
                    total,
                    data,
                    next_seq: 0,
                };
                Ok(Progress::Pending)
            }
            State::Collecting {
                cmd,
                total,
                data,
                next_seq,
            } => {
                if frame.is_init() {
                    return Err(CtapHidError::InvalidSeq);
                }
                if frame.masked_seq() != *next_seq {
                    return Err(CtapHidError::InvalidSeq);
                }
                *next_seq = next_seq.wrapping_add(1);
                let chunk = (*total - data.len()).min(CONT_DATA_SIZE);
                data.extend_from_slice(&frame.cont_data()[..chunk]);
                if data.len() == *total {
                    let message = Message {
                        cmd: *cmd,
                        payload: std::mem::take(data),
                    };
                    self.state = State::AwaitInit;
                    Ok(Progress::Complete(message))
                } else {
                    Ok(Progress::Pending)
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_absorb_rejects_oversized_length() {
        let mut assembler = Assembler::new(0x1234_5678);
        let frame = Frame::init(0x1234_5678, CMD_CBOR, (MAX_MESSAGE_SIZE as u16) + 1, &[]);
        assert_eq!(
            assembler.absorb(&frame).unwrap_err(),
            CtapHidError::InvalidLength
        );
    }

    #[test]
    fn test_absorb_accepts_max_length() {
        let mut assembler = Assembler::new(0x1234_5678);
        let chunk = [0u8; INIT_DATA_SIZE];
        let frame = Frame::init(0x1234_5678, CMD_CBOR, MAX_MESSAGE_SIZE as u16, &chunk);
        assert!(matches!(assembler.absorb(&frame), Ok(Progress::Pending)));
    }

    #[test]
    fn test_absorb_ignores_foreign_channel() {
        let mut assembler = Assembler::new(0x0000_0001);
        let frame = Frame::init(0x0000_0002, CMD_PING, 3, &[1, 2, 3]);
        assert!(matches!(assembler.absorb(&frame), Ok(Progress::Ignored)));
    }

    #[test]
    fn test_absorb_ignores_stray_continuation() {
        let mut assembler = Assembler::new(0x0000_0001);
        let frame = Frame::cont(0x0000_0001, 0, &[0xAB; CONT_DATA_SIZE]);
        assert!(matches!(assembler.absorb(&frame), Ok(Progress::Ignored)));
    }

    #[test]
    fn test_absorb_decodes_error_frame() {
        let mut assembler = Assembler::new(0x0000_0001);
        let frame = Frame::init(0x0000_0001, CMD_ERROR, 1, &[ERR_CHANNEL_BUSY]);
        assert_eq!(
            assembler.absorb(&frame).unwrap_err(),
            CtapHidError::ChannelBusy
        );
    }

    #[test]
    fn test_absorb_rejects_second_init_mid_message() {
        let mut assembler = Assembler::new(0x0000_0001);
        let first = Frame::init(0x0000_0001, CMD_MSG, 120, &[0xAA; INIT_DATA_SIZE]);
        assert!(matches!(assembler.absorb(&first), Ok(Progress::Pending)));
        let second = Frame::init(0x0000_0001, CMD_MSG, 120, &[0xAA; INIT_DATA_SIZE]);
        assert_eq!(
            assembler.absorb(&second).unwrap_err(),
            CtapHidError::InvalidSeq
        );
    }
}
