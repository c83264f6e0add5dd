//! Wire framing between a `daemon exec` client and the daemon server,
//! per spec.md §5, §9: "length-prefixed records terminated by a sentinel,
//! to cope with commands that do not emit trailing newlines."
//!
//! A frame is `[1-byte tag][4-byte little-endian length][payload]`. Tags
//! distinguish the request from the server's response parts so a client
//! can tell a merged stdout/stderr chunk from the env-delta script and the
//! final exit code without guessing at a newline convention.

use std::io::{self, Read, Write};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameTag {
    /// Client → server: the bash input to run.
    Request,
    /// Server → client: merged stdout/stderr bytes from the command.
    Output,
    /// Server → client: the env-delta script (may be empty).
    EnvDelta,
    /// Server → client: terminates a response, carrying the exit code.
    End,
    /// Client → server: ask the daemon to stop accepting connections.
    Shutdown,
}

impl FrameTag {
    fn to_byte(self) -> u8 {
        match self {
            FrameTag::Request => 0,
            FrameTag::Output => 1,
            FrameTag::EnvDelta => 2,
            FrameTag::End => 3,
            FrameTag::Shutdown => 4,
        }
    }

    fn from_byte(b: u8) -> io::Result<Self> {
        match b {
            0 => Ok(FrameTag::Request),
            1 => Ok(FrameTag::Output),
            2 => Ok(FrameTag::EnvDelta),
            3 => Ok(FrameTag::End),
            4 => Ok(FrameTag::Shutdown),
            other => Err(io::Error::new(
                io::ErrorKind::InvalidData,
                format!("unknown daemon frame tag {other}"),
            )),
        }
    }
}

/// Writes one frame to `w` and flushes it so partial writes never straddle
/// a read on the other end.
pub fn write_frame(w: &mut impl Write, tag: FrameTag, payload: &[u8]) -> io::Result<()> {
    let len = u32::try_from(payload.len())
        .map_err(|_| io::Error::new(io::ErrorKind::InvalidInput, "frame payload too large"))?;
    w.write_all(&[tag.to_byte()])?;
    w.write_all(&len.to_le_bytes())?;
    w.write_all(payload)?;
    w.flush()
}

/// Reads one frame from `r`. Returns `Ok(None)` on a clean EOF at a frame
/// boundary (the peer closed the connection between frames, not mid-frame).
pub fn read_frame(r: &mut impl Read) -> io::Result<Option<(FrameTag, Vec<u8>)>> {
    let mut tag_byte = [0u8; 1];
    match r.read(&mut tag_byte)? {
        0 => return Ok(None),
        _ => {}
    }
    let tag = FrameTag::from_byte(tag_byte[0])?;
    let mut len_bytes = [0u8; 4];
    r.read_exact(&mut len_bytes)?;
    let len = u32::from_le_bytes(len_bytes) as usize;
    let mut payload = vec![0u8; len];
    r.read_exact(&mut payload)?;
    Ok(Some((tag, payload)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn round_trips_a_frame() {
        let mut buf = Vec::new();
        write_frame(&mut buf, FrameTag::Output, b"hello").unwrap();
        let mut cursor = Cursor::new(buf);
        let (tag, payload) = read_frame(&mut cursor).unwrap().unwrap();
        assert_eq!(tag, FrameTag::Output);
        assert_eq!(payload, b"hello");
    }

    #[test]
    fn round_trips_an_empty_payload() {
        let mut buf = Vec::new();
        write_frame(&mut buf, FrameTag::EnvDelta, b"").unwrap();
        let mut cursor = Cursor::new(buf);
        let (tag, payload) = read_frame(&mut cursor).unwrap().unwrap();
        assert_eq!(tag, FrameTag::EnvDelta);
        assert!(payload.is_empty());
    }

    #[test]
    fn reads_multiple_frames_in_sequence() {
        let mut buf = Vec::new();
        write_frame(&mut buf, FrameTag::Output, b"one").unwrap();
        write_frame(&mut buf, FrameTag::Output, b"two").unwrap();
        write_frame(&mut buf, FrameTag::End, &42i32.to_le_bytes()).unwrap();
        let mut cursor = Cursor::new(buf);
        let (tag1, p1) = read_frame(&mut cursor).unwrap().unwrap();
        let (tag2, p2) = read_frame(&mut cursor).unwrap().unwrap();
        let (tag3, p3) = read_frame(&mut cursor).unwrap().unwrap();
        assert_eq!((tag1, p1), (FrameTag::Output, b"one".to_vec()));
        assert_eq!((tag2, p2), (FrameTag::Output, b"two".to_vec()));
        assert_eq!(tag3, FrameTag::End);
        assert_eq!(i32::from_le_bytes(p3.try_into().unwrap()), 42);
    }

    #[test]
    fn clean_eof_at_boundary_is_none() {
        let mut cursor = Cursor::new(Vec::<u8>::new());
        assert!(read_frame(&mut cursor).unwrap().is_none());
    }
}
