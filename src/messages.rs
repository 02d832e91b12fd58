// Command characters understood by the rig.
//
// The host sends annotated move strings such as "(TLTTRT) R>", so
// whitespace and parentheses carry no operation and are skipped.

/// One serial byte maps to at most one sequencer operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    /// `L`: rotate the lower layer 90° to the left
    RotateLeft,
    /// `R`: rotate the lower layer 90° to the right
    RotateRight,
    /// `T`: tip the cube onto its side
    FlipCube,
    /// `I`: re-home both servos
    Home,
    /// `>`: no motion; acknowledge that the preceding moves completed
    Ack,
}

/// Reply line written on the command port once the rig is homed and after
/// each [`Command::Ack`]. The host blocks on this line.
pub const REPLY_OK: &str = "ok\n";

impl Command {
    /// Decode one command byte. `None` for bytes that carry no operation.
    pub fn from_byte(byte: u8) -> Option<Self> {
        match byte {
            b'L' => Some(Command::RotateLeft),
            b'R' => Some(Command::RotateRight),
            b'T' => Some(Command::FlipCube),
            b'I' => Some(Command::Home),
            b'>' => Some(Command::Ack),
            _ => None,
        }
    }

    /// Bytes that are expected filler in host move strings.
    pub fn is_filler(byte: u8) -> bool {
        byte.is_ascii_whitespace() || byte == b'(' || byte == b')'
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_move_characters() {
        assert_eq!(Command::from_byte(b'L'), Some(Command::RotateLeft));
        assert_eq!(Command::from_byte(b'R'), Some(Command::RotateRight));
        assert_eq!(Command::from_byte(b'T'), Some(Command::FlipCube));
        assert_eq!(Command::from_byte(b'I'), Some(Command::Home));
        assert_eq!(Command::from_byte(b'>'), Some(Command::Ack));
    }

    #[test]
    fn lowercase_and_unknown_bytes_decode_to_nothing() {
        assert_eq!(Command::from_byte(b'l'), None);
        assert_eq!(Command::from_byte(b'x'), None);
        assert_eq!(Command::from_byte(0x00), None);
    }

    #[test]
    fn move_string_filler_is_recognized() {
        for b in *b" \t\r\n()" {
            assert!(Command::is_filler(b));
        }
        assert!(!Command::is_filler(b'L'));
        assert!(!Command::is_filler(b'x'));
    }
}
