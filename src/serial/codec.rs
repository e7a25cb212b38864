use std::io;

use bytes::{Buf, BufMut, BytesMut};
use tokio_util::codec::{Decoder, Encoder};

/// Commands understood by the LED firmware. Each one is a single byte on the wire.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum LedCommand {
    On,
}

impl LedCommand {
    pub const fn as_byte(self) -> u8 {
        match self {
            LedCommand::On => b'P',
        }
    }
}

impl TryFrom<u8> for LedCommand {
    type Error = io::Error;

    fn try_from(byte: u8) -> Result<Self, Self::Error> {
        match byte {
            b'P' => Ok(LedCommand::On),
            other => Err(io::Error::new(
                io::ErrorKind::InvalidData,
                format!("unknown LED command byte 0x{other:02x}"),
            )),
        }
    }
}

/// One byte per command, no framing, no checksum.
#[derive(Debug, Default)]
pub struct CommandCodec(());

impl Encoder<LedCommand> for CommandCodec {
    type Error = io::Error;

    fn encode(&mut self, item: LedCommand, dst: &mut BytesMut) -> Result<(), Self::Error> {
        dst.put_u8(item.as_byte());
        Ok(())
    }
}

impl Decoder for CommandCodec {
    type Item = LedCommand;
    type Error = io::Error;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        if src.is_empty() {
            return Ok(None);
        }
        LedCommand::try_from(src.get_u8()).map(Some)
    }
}
