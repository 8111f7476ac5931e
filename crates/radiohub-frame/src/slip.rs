//! SLIP (RFC 1055) framing.
//!
//! Every frame is sent as `END payload END`; `END` and `ESC` inside the
//! payload are escaped. The decoder is a three-state machine that can be
//! fed a chunk or a single byte at a time; both go through the same
//! transition.

use bytes::{BufMut, BytesMut};

use crate::message::WireMessage;

pub const END: u8 = 0xC0;
pub const ESC: u8 = 0xDB;
pub const ESC_END: u8 = 0xDC;
pub const ESC_ESC: u8 = 0xDD;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SlipState {
    /// Waiting for an `END` to start a frame; everything else is noise.
    #[default]
    Idle,
    /// Collecting payload bytes.
    InFrame,
    /// The previous byte was `ESC`.
    Escaped,
}

/// Incremental SLIP decoder writing into a caller-owned [`WireMessage`].
///
/// The output message is bounded: an oversized frame is truncated and will
/// fail its CRC check downstream.
#[derive(Debug, Clone, Default)]
pub struct SlipDecoder {
    state: SlipState,
}

impl SlipDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> SlipState {
        self.state
    }

    /// Abandon any partial frame and wait for the next `END`.
    pub fn reset(&mut self) {
        self.state = SlipState::Idle;
    }

    /// Feed a chunk. `on_frame` runs once for every completed, non-empty
    /// frame; `output` is cleared after each call.
    pub fn decode<F>(&mut self, chunk: &[u8], output: &mut WireMessage, mut on_frame: F)
    where
        F: FnMut(&mut WireMessage),
    {
        for &byte in chunk {
            self.decode_byte(byte, output, &mut on_frame);
        }
    }

    /// Feed one byte.
    pub fn decode_byte<F>(&mut self, byte: u8, output: &mut WireMessage, on_frame: &mut F)
    where
        F: FnMut(&mut WireMessage),
    {
        self.state = match (self.state, byte) {
            (SlipState::Idle, END) => {
                output.clear();
                SlipState::InFrame
            }
            (SlipState::Idle, _) => SlipState::Idle,
            (SlipState::InFrame, END) => {
                if !output.is_empty() {
                    on_frame(output);
                }
                output.clear();
                SlipState::InFrame
            }
            (SlipState::InFrame, ESC) => SlipState::Escaped,
            (SlipState::InFrame, _) => {
                output.append_u8(byte);
                SlipState::InFrame
            }
            (SlipState::Escaped, ESC_END) => {
                output.append_u8(END);
                SlipState::InFrame
            }
            (SlipState::Escaped, ESC_ESC) => {
                output.append_u8(ESC);
                SlipState::InFrame
            }
            (SlipState::Escaped, _) => SlipState::Idle,
        };
    }
}

/// Append `END`, the escaped `input`, and a closing `END` to `dst`.
pub fn encode(input: &[u8], dst: &mut BytesMut) {
    encode_with_wakeup(input, 0, dst);
}

/// Like [`encode`], preceded by `wakeup` extra `END` bytes.
pub fn encode_with_wakeup(input: &[u8], wakeup: usize, dst: &mut BytesMut) {
    let escapes = input.iter().filter(|&&b| b == END || b == ESC).count();
    dst.reserve(wakeup + input.len() + escapes + 2);

    dst.put_bytes(END, wakeup + 1);
    for &byte in input {
        match byte {
            END => dst.put_slice(&[ESC, ESC_END]),
            ESC => dst.put_slice(&[ESC, ESC_ESC]),
            _ => dst.put_u8(byte),
        }
    }
    dst.put_u8(END);
}

#[cfg(test)]
mod tests {
    use super::*;

    fn decode_all(decoder: &mut SlipDecoder, wire: &[u8]) -> Vec<Vec<u8>> {
        let mut output = WireMessage::new(64);
        let mut frames = Vec::new();
        decoder.decode(wire, &mut output, |msg| frames.push(msg.as_bytes().to_vec()));
        frames
    }

    fn encoded(input: &[u8]) -> Vec<u8> {
        let mut dst = BytesMut::new();
        encode(input, &mut dst);
        dst.to_vec()
    }

    #[test]
    fn encode_ping_request() {
        assert_eq!(
            encoded(&[0x01, 0x01, 0x16, 0x07]),
            vec![0xC0, 0x01, 0x01, 0x16, 0x07, 0xC0]
        );
    }

    #[test]
    fn encode_escapes_specials() {
        assert_eq!(
            encoded(&[0x01, END, 0x02, ESC]),
            vec![END, 0x01, ESC, ESC_END, 0x02, ESC, ESC_ESC, END]
        );
    }

    #[test]
    fn wakeup_bytes_are_prepended() {
        let mut dst = BytesMut::new();
        encode_with_wakeup(&[0x42], 3, &mut dst);
        assert_eq!(dst.as_ref(), &[END, END, END, END, 0x42, END]);
    }

    #[test]
    fn roundtrip_with_special_bytes() {
        let payload = [0x00, END, 0x10, ESC, ESC_END, ESC_ESC, END, END, 0xFF];
        let mut decoder = SlipDecoder::new();
        let frames = decode_all(&mut decoder, &encoded(&payload));
        assert_eq!(frames, vec![payload.to_vec()]);
        assert_eq!(decoder.state(), SlipState::InFrame);
    }

    fn roundtrip(payload: &[u8]) -> Vec<Vec<u8>> {
        let mut output = WireMessage::new(payload.len().max(1));
        let mut frames = Vec::new();
        SlipDecoder::new().decode(&encoded(payload), &mut output, |msg| {
            frames.push(msg.as_bytes().to_vec())
        });
        frames
    }

    #[test]
    fn roundtrip_every_single_byte() {
        for byte in 0..=u8::MAX {
            assert_eq!(roundtrip(&[byte]), vec![vec![byte]], "byte {byte:#04x}");
        }
    }

    #[test]
    fn roundtrip_long_runs_of_specials() {
        for special in [END, ESC] {
            let run = vec![special; 300];
            let wire = encoded(&run);
            assert_eq!(wire.len(), 2 + 2 * run.len());
            assert_eq!(roundtrip(&run), vec![run]);
        }

        let mixed: Vec<u8> = [END, ESC].iter().copied().cycle().take(301).collect();
        assert_eq!(roundtrip(&mixed), vec![mixed]);
    }

    #[test]
    fn roundtrip_escape_code_values() {
        for payload in [
            vec![ESC_END; 64],
            vec![ESC_ESC; 64],
            [ESC_END, ESC_ESC].repeat(32),
            vec![ESC, ESC_END, END, ESC_ESC],
        ] {
            assert_eq!(roundtrip(&payload), vec![payload]);
        }
    }

    #[test]
    fn roundtrip_generated_sequences() {
        // xorshift32, fixed seed
        let mut state = 0x2545_F491_u32;
        let mut next = move || {
            state ^= state << 13;
            state ^= state >> 17;
            state ^= state << 5;
            state
        };

        let mut payloads = Vec::new();
        let mut stream = Vec::new();
        for _ in 0..500 {
            let len = 1 + (next() % 200) as usize;
            let payload: Vec<u8> = (0..len)
                .map(|_| match next() % 6 {
                    0 => END,
                    1 => ESC,
                    2 => ESC_END,
                    3 => ESC_ESC,
                    _ => next() as u8,
                })
                .collect();
            assert_eq!(roundtrip(&payload), vec![payload.clone()]);
            stream.extend_from_slice(&encoded(&payload));
            payloads.push(payload);
        }

        let mut output = WireMessage::new(256);
        let mut frames = Vec::new();
        SlipDecoder::new().decode(&stream, &mut output, |msg| {
            frames.push(msg.as_bytes().to_vec())
        });
        assert_eq!(frames, payloads);
    }

    #[test]
    fn back_to_back_ends_yield_no_frame() {
        assert_eq!(encoded(&[]), vec![END, END]);

        let mut decoder = SlipDecoder::new();
        assert!(decode_all(&mut decoder, &[END, END]).is_empty());
        assert_eq!(decoder.state(), SlipState::InFrame);
    }

    #[test]
    fn byte_by_byte_matches_chunked() {
        let mut wire = encoded(b"first");
        wire.extend_from_slice(&encoded(&[END, ESC]));

        let chunked = decode_all(&mut SlipDecoder::new(), &wire);

        let mut decoder = SlipDecoder::new();
        let mut output = WireMessage::new(64);
        let mut frames = Vec::new();
        let mut collect = |msg: &mut WireMessage| frames.push(msg.as_bytes().to_vec());
        for &byte in &wire {
            decoder.decode_byte(byte, &mut output, &mut collect);
        }

        assert_eq!(frames, chunked);
        assert_eq!(frames, vec![b"first".to_vec(), vec![END, ESC]]);
    }

    #[test]
    fn noise_before_first_end_is_discarded() {
        let mut wire = vec![0x11, 0x22, ESC, 0x33];
        wire.extend_from_slice(&encoded(b"ok"));
        assert_eq!(decode_all(&mut SlipDecoder::new(), &wire), vec![b"ok".to_vec()]);
    }

    #[test]
    fn empty_frames_are_skipped() {
        let wire = [END, END, END, 0x01, END, END];
        assert_eq!(decode_all(&mut SlipDecoder::new(), &wire), vec![vec![0x01]]);
    }

    #[test]
    fn bad_escape_abandons_frame_and_resyncs() {
        let mut wire = vec![END, 0x01, 0x02, ESC, 0x55, 0x03, 0x04];
        wire.extend_from_slice(&encoded(b"next"));

        let mut decoder = SlipDecoder::new();
        let frames = decode_all(&mut decoder, &wire);
        assert_eq!(frames, vec![b"next".to_vec()]);
    }

    #[test]
    fn reset_cancels_partial_frame() {
        let mut decoder = SlipDecoder::new();
        let mut output = WireMessage::new(16);
        let mut frames = 0;

        decoder.decode(&[END, 0x01, 0x02], &mut output, |_| frames += 1);
        assert_eq!(decoder.state(), SlipState::InFrame);

        decoder.reset();
        assert_eq!(decoder.state(), SlipState::Idle);
        decoder.decode(&[0x03, END], &mut output, |_| frames += 1);
        assert_eq!(frames, 0);
        assert_eq!(decoder.state(), SlipState::InFrame);
    }

    #[test]
    fn oversized_frame_is_truncated() {
        let mut decoder = SlipDecoder::new();
        let mut output = WireMessage::new(4);
        let mut frames = Vec::new();
        decoder.decode(&encoded(b"abcdefgh"), &mut output, |msg| {
            frames.push(msg.as_bytes().to_vec())
        });
        assert_eq!(frames, vec![b"abcd".to_vec()]);
    }
}
