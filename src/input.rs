//! Decoding of raw terminal bytes into game keys.

use crate::snake::Direction;

const ESC: u8 = 0x1b;
const CTRL_C: u8 = 0x03;

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Key {
    Turn(Direction),
    Quit,
}

/// Everything read from the terminal during one tick.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct InputBatch {
    pub turns: Vec<Direction>,
    pub quit: bool,
}

enum Scan {
    /// `len` bytes were used up, yielding `key` if they meant anything.
    Done { key: Option<Key>, len: usize },
    /// The buffer ends partway through an escape sequence.
    Incomplete,
}

/// Splits `bytes` into keys. Arrow keys arrive as `ESC [ A`..`ESC [ D` (or
/// `ESC O A`..`ESC O D` in application cursor mode); anything unrecognised,
/// including a sequence cut off at the end of the buffer, is skipped.
pub fn parse_keys(bytes: &[u8]) -> Vec<Key> {
    split_keys(bytes).0
}

/// Like `parse_keys`, but also reports how many bytes were consumed. Anything
/// past that is the start of an unfinished escape sequence.
fn split_keys(bytes: &[u8]) -> (Vec<Key>, usize) {
    let mut keys = vec![];
    let mut i = 0;

    while i < bytes.len() {
        match scan(&bytes[i..]) {
            Scan::Done { key, len } => {
                keys.extend(key);
                i += len;
            }
            Scan::Incomplete => break,
        }
    }

    (keys, i)
}

fn scan(bytes: &[u8]) -> Scan {
    if bytes[0] != ESC {
        return Scan::Done { key: plain_key(bytes[0]), len: 1 };
    }

    match bytes.get(1) {
        None => Scan::Incomplete,
        Some(b'O') => match bytes.get(2) {
            None => Scan::Incomplete,
            Some(code) => Scan::Done { key: arrow(*code).map(Key::Turn), len: 3 },
        },
        Some(b'[') => {
            // CSI: parameter and intermediate bytes, then one final byte.
            let body = &bytes[2..];
            match body.iter().position(|b| !(0x20..=0x3f).contains(b)) {
                None => Scan::Incomplete,
                Some(n) => {
                    let key = if n == 0 { arrow(body[0]).map(Key::Turn) } else { None };
                    // A byte outside the final range aborts the sequence and is
                    // read again on its own.
                    let len = if (0x40..=0x7e).contains(&body[n]) { 2 + n + 1 } else { 2 + n };
                    Scan::Done { key, len }
                }
            }
        }
        // A lone escape press.
        Some(_) => Scan::Done { key: None, len: 1 },
    }
}

/// Turns successive terminal reads into per-tick batches, holding back an
/// escape sequence split across two reads until the rest of it arrives.
#[derive(Debug, Default)]
pub struct KeyDecoder {
    pending: Vec<u8>,
}

impl KeyDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn feed(&mut self, bytes: &[u8]) -> InputBatch {
        self.pending.extend_from_slice(bytes);
        let (keys, used) = split_keys(&self.pending);
        self.pending.drain(..used);

        let mut batch = InputBatch::default();
        for key in keys {
            match key {
                Key::Turn(dir) => batch.turns.push(dir),
                Key::Quit => batch.quit = true,
            }
        }
        batch
    }
}

fn arrow(code: u8) -> Option<Direction> {
    match code {
        b'A' => Some(Direction::Up),
        b'B' => Some(Direction::Down),
        b'C' => Some(Direction::Right),
        b'D' => Some(Direction::Left),
        _ => None,
    }
}

fn plain_key(b: u8) -> Option<Key> {
    match b {
        b'w' | b'W' => Some(Key::Turn(Direction::Up)),
        b's' | b'S' => Some(Key::Turn(Direction::Down)),
        b'a' | b'A' => Some(Key::Turn(Direction::Left)),
        b'd' | b'D' => Some(Key::Turn(Direction::Right)),
        b'q' | b'Q' | CTRL_C => Some(Key::Quit),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::snake::Direction::{Down, Left, Right, Up};

    #[test]
    fn test_arrow_keys() {
        assert_eq!(
            parse_keys(b"\x1b[A\x1b[B\x1b[C\x1b[D"),
            vec![Key::Turn(Up), Key::Turn(Down), Key::Turn(Right), Key::Turn(Left)]
        );
        assert_eq!(parse_keys(b"\x1bOA"), vec![Key::Turn(Up)]);
    }

    #[test]
    fn test_wasd_either_case() {
        assert_eq!(
            parse_keys(b"wasdWASD"),
            vec![
                Key::Turn(Up),
                Key::Turn(Left),
                Key::Turn(Down),
                Key::Turn(Right),
                Key::Turn(Up),
                Key::Turn(Left),
                Key::Turn(Down),
                Key::Turn(Right),
            ]
        );
    }

    #[test]
    fn test_quit_keys() {
        assert_eq!(parse_keys(b"q"), vec![Key::Quit]);
        assert_eq!(parse_keys(b"Q"), vec![Key::Quit]);
        assert_eq!(parse_keys(&[CTRL_C]), vec![Key::Quit]);
    }

    #[test]
    fn test_garbage_is_dropped() {
        assert_eq!(parse_keys(b"x1 \r\n"), Vec::<Key>::new());
        assert_eq!(parse_keys(b"\x1b[Z"), Vec::<Key>::new());
        // Bare escape followed by a movement key still yields the key.
        assert_eq!(parse_keys(b"\x1bw"), vec![Key::Turn(Up)]);
    }

    #[test]
    fn test_truncated_sequence_is_dropped() {
        assert_eq!(parse_keys(b"d\x1b["), vec![Key::Turn(Right)]);
        assert_eq!(parse_keys(b"d\x1b"), vec![Key::Turn(Right)]);
        assert_eq!(parse_keys(b"d\x1b[1;5"), vec![Key::Turn(Right)]);
    }

    #[test]
    fn test_arrow_letters_are_not_mistaken_for_wasd() {
        // 'A' after ESC [ is an arrow, a bare 'A' is a left turn.
        assert_eq!(parse_keys(b"\x1b[AA"), vec![Key::Turn(Up), Key::Turn(Left)]);
    }

    #[test]
    fn test_modified_arrows_are_dropped_whole() {
        // Shift+Left and Ctrl+Up end in 'D' and 'A', which must not leak out as WASD.
        assert_eq!(parse_keys(b"\x1b[1;2D"), Vec::<Key>::new());
        assert_eq!(parse_keys(b"\x1b[1;5A"), Vec::<Key>::new());
        assert_eq!(parse_keys(b"\x1b[1;5Aw"), vec![Key::Turn(Up)]);
    }

    #[test]
    fn test_tilde_sequences_are_dropped() {
        assert_eq!(parse_keys(b"\x1b[15~"), Vec::<Key>::new());
        assert_eq!(parse_keys(b"\x1b[3~d"), vec![Key::Turn(Right)]);
    }

    #[test]
    fn test_broken_sequence_releases_following_byte() {
        assert_eq!(parse_keys(b"\x1b[1\x03"), vec![Key::Quit]);
    }

    #[test]
    fn test_decoder_batches_and_flags_quit() {
        let mut decoder = KeyDecoder::new();
        let batch = decoder.feed(b"w\x1b[Cq");
        assert_eq!(batch.turns, vec![Up, Right]);
        assert!(batch.quit);

        assert_eq!(decoder.feed(b""), InputBatch::default());
    }

    #[test]
    fn test_decoder_joins_sequence_split_across_reads() {
        let mut decoder = KeyDecoder::new();
        assert_eq!(decoder.feed(b"s\x1b["), InputBatch { turns: vec![Down], quit: false });
        assert_eq!(decoder.feed(b"A"), InputBatch { turns: vec![Up], quit: false });

        assert_eq!(decoder.feed(b"\x1b[1;"), InputBatch::default());
        assert_eq!(decoder.feed(b"2D"), InputBatch::default());

        assert_eq!(decoder.feed(b"\x1b"), InputBatch::default());
        assert_eq!(decoder.feed(b"OB"), InputBatch { turns: vec![Down], quit: false });
    }

    #[test]
    fn test_decoder_drops_lone_escape_once_more_input_arrives() {
        let mut decoder = KeyDecoder::new();
        assert_eq!(decoder.feed(b"\x1b"), InputBatch::default());
        assert_eq!(decoder.feed(b"d"), InputBatch { turns: vec![Right], quit: false });
    }
}
