use fidoprobe::ctaphid::assembly::{Assembler, Progress};
use fidoprobe::ctaphid::packet::{encode_request, Frame};
use fidoprobe::ctaphid::types::*;

fn frame_bytes(frame: &Frame) -> [u8; 64] {
    let report = frame.as_report();
    let mut bytes = [0u8; 64];
    bytes.copy_from_slice(&report[1..]);
    bytes
}

#[test]
fn test_single_frame_ping_wire_layout() {
    let frames = encode_request(0x1234_5678, CMD_PING, &[0x01, 0x02, 0x03]);
    assert_eq!(frames.len(), 1);

    let report = frames[0].as_report();
    assert_eq!(report[0], 0x00, "un-numbered report id");
    assert_eq!(&report[1..5], &[0x12, 0x34, 0x56, 0x78], "CID in network order");
    assert_eq!(report[5], 0x81, "PING with init mask");
    assert_eq!(&report[6..8], &[0x00, 0x03], "big-endian length");
    assert_eq!(&report[8..11], &[0x01, 0x02, 0x03]);
    assert!(report[11..].iter().all(|&b| b == PAD_BYTE), "trailing padding");
}

#[test]
fn test_empty_payload_still_emits_one_init_frame() {
    let frames = encode_request(0x0000_0001, CMD_WINK, &[]);
    assert_eq!(frames.len(), 1);
    assert_eq!(frames[0].payload_len(), 0);
    assert!(frames[0].init_data().iter().all(|&b| b == PAD_BYTE));
}

#[test]
fn test_multi_frame_fragmentation() {
    let payload = [0xAA; 120];
    let frames = encode_request(0x0000_0001, CMD_MSG, &payload);
    assert_eq!(frames.len(), 3);

    let init = frame_bytes(&frames[0]);
    assert_eq!(init[4], CMD_MSG);
    assert_eq!(&init[5..7], &[0x00, 0x78]);
    assert!(init[7..].iter().all(|&b| b == 0xAA));

    let first_cont = frame_bytes(&frames[1]);
    assert_eq!(first_cont[4], 0, "first continuation sequence");
    assert!(first_cont[5..].iter().all(|&b| b == 0xAA));

    let second_cont = frame_bytes(&frames[2]);
    assert_eq!(second_cont[4], 1, "second continuation sequence");
    assert!(second_cont[5..9].iter().all(|&b| b == 0xAA));
    assert!(second_cont[9..].iter().all(|&b| b == PAD_BYTE));
}

#[test]
fn test_continuation_sequence_is_monotonic() {
    let payload = vec![0x5A; MAX_MESSAGE_SIZE];
    let frames = encode_request(0x0000_0001, CMD_CBOR, &payload);
    assert_eq!(frames.len(), 129, "one INIT plus 128 CONT frames");
    assert!(frames[0].is_init());
    for (k, frame) in frames[1..].iter().enumerate() {
        assert!(!frame.is_init());
        assert_eq!(frame.masked_seq(), k as u8);
    }
}

#[test]
fn test_fragment_then_reassemble_round_trips() {
    for len in [0usize, 1, 56, 57, 58, 116, 117, 1000, MAX_MESSAGE_SIZE] {
        let payload: Vec<u8> = (0..len).map(|i| (i % 251) as u8).collect();
        let frames = encode_request(0xABCD_0123, CMD_CBOR, &payload);

        let mut assembler = Assembler::new(0xABCD_0123);
        let mut complete = None;
        for frame in &frames {
            match assembler.absorb(frame).unwrap() {
                Progress::Complete(message) => {
                    complete = Some(message);
                }
                Progress::Pending => assert!(complete.is_none()),
                Progress::Ignored => panic!("own frame ignored at len {len}"),
            }
        }
        let message = complete.unwrap_or_else(|| panic!("no message at len {len}"));
        assert_eq!(message.cmd, CMD_CBOR);
        assert_eq!(message.payload, payload, "payload mismatch at len {len}");
    }
}

#[test]
fn test_padding_is_not_observable_after_reassembly() {
    let frames = encode_request(0x0000_0001, CMD_PING, &[0x42]);
    let mut assembler = Assembler::new(0x0000_0001);
    match assembler.absorb(&frames[0]).unwrap() {
        Progress::Complete(message) => assert_eq!(message.payload, vec![0x42]),
        _ => panic!("single-frame message must complete immediately"),
    }
}

#[test]
fn test_frame_accessors() {
    let init = Frame::init(0xDEAD_BEEF, CMD_INIT, 17, &[0u8; 17]);
    assert!(init.is_init());
    assert_eq!(init.cid(), 0xDEAD_BEEF);
    assert_eq!(init.cmd(), CMD_INIT);
    assert_eq!(init.payload_len(), 17);

    let cont = Frame::cont(0xDEAD_BEEF, 5, &[1, 2, 3]);
    assert!(!cont.is_init());
    assert_eq!(cont.masked_seq(), 5);
    assert_eq!(&cont.cont_data()[..3], &[1, 2, 3]);
}

#[test]
fn test_report_unpack_preserves_wire_bytes() {
    let original = Frame::init(0x0102_0304, CMD_PING, 3, &[9, 8, 7]);
    let unpacked = Frame::from_report(&frame_bytes(&original));
    assert_eq!(unpacked.cid(), 0x0102_0304);
    assert_eq!(unpacked.cmd(), CMD_PING);
    assert_eq!(unpacked.payload_len(), 3);
    assert_eq!(&unpacked.init_data()[..3], &[9, 8, 7]);
}
