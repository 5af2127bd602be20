//! 报文解析错误

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    #[error("truncated: need {need} bytes, got {got}")]
    Truncated { need: usize, got: usize },
    #[error("unsupported IP version {0}")]
    BadVersion(u8),
    #[error("bad header length {0}")]
    BadHeaderLength(usize),
    #[error("header checksum mismatch")]
    BadChecksum,
    #[error("unsupported {what}: {value:#x}")]
    Unsupported { what: &'static str, value: u32 },
    #[error("payload of {0} bytes does not fit in an IPv4 datagram")]
    PayloadTooLarge(usize),
    #[error("invalid address literal {0:?}")]
    BadAddress(String),
}

pub(crate) fn need(buf: &[u8], len: usize) -> Result<(), ParseError> {
    if buf.len() < len {
        return Err(ParseError::Truncated {
            need: len,
            got: buf.len(),
        });
    }
    Ok(())
}
