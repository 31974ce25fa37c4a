//! Start magic and varint length-prefixed frames.
//!
//! Every response and every materialized file starts with [`START_MAGIC`].
//! Frames are an unsigned LEB128 length followed by that many bytes; a
//! zero-length frame terminates a record stream.

use std::io::{ErrorKind, Read, Write};

use bytes::{Buf, BufMut, Bytes, BytesMut};

use crate::error::FrameError;

/// `"CDFS"`.
pub const START_MAGIC: [u8; 4] = [0x43, 0x44, 0x46, 0x53];

/// Largest frame accepted before allocating (2 GiB).
pub const MAX_FRAME_LEN: u64 = 1 << 31;

const MAX_VARINT_LEN: usize = 10;

pub fn write_start<W: Write + ?Sized>(sink: &mut W) -> std::io::Result<()> {
    sink.write_all(&START_MAGIC)
}

/// Consume four bytes and check them against [`START_MAGIC`]. A source
/// shorter than four bytes is reported as bad magic with what was found.
pub fn read_start<R: Read + ?Sized>(source: &mut R) -> Result<(), FrameError> {
    let mut found = [0u8; 4];
    let n = read_up_to(source, &mut found)?;
    if n < found.len() || found != START_MAGIC {
        return Err(FrameError::BadMagic {
            found: found[..n].to_vec(),
        });
    }
    Ok(())
}

/// Write `value` as an unsigned LEB128 varint, returning the bytes written.
pub fn write_varint<W: Write + ?Sized>(sink: &mut W, value: u64) -> std::io::Result<usize> {
    let mut buf = [0u8; MAX_VARINT_LEN];
    let n = encode_varint(value, &mut buf);
    sink.write_all(&buf[..n])?;
    Ok(n)
}

pub fn read_varint<R: Read + ?Sized>(source: &mut R) -> Result<u64, FrameError> {
    read_varint_or_end(source)?.ok_or(FrameError::Truncated {
        expected: 1,
        available: 0,
    })
}

pub fn write_length_prefixed<W: Write + ?Sized>(sink: &mut W, bytes: &[u8]) -> std::io::Result<()> {
    write_varint(sink, bytes.len() as u64)?;
    sink.write_all(bytes)
}

pub fn read_length_prefixed<R: Read + ?Sized>(source: &mut R) -> Result<Bytes, FrameError> {
    let length = read_varint(source)?;
    read_body(source, length)
}

/// Like [`read_length_prefixed`], but `Ok(None)` when the source is already
/// exhausted at the frame boundary.
pub fn read_frame_or_end<R: Read + ?Sized>(source: &mut R) -> Result<Option<Bytes>, FrameError> {
    match read_varint_or_end(source)? {
        Some(length) => read_body(source, length).map(Some),
        None => Ok(None),
    }
}

/// Append a length-prefixed frame to an in-memory buffer.
pub fn put_length_prefixed(buf: &mut BytesMut, bytes: &[u8]) {
    put_varint(buf, bytes.len() as u64);
    buf.put_slice(bytes);
}

pub fn put_varint(buf: &mut BytesMut, value: u64) {
    let mut scratch = [0u8; MAX_VARINT_LEN];
    let n = encode_varint(value, &mut scratch);
    buf.put_slice(&scratch[..n]);
}

/// Split [`START_MAGIC`] off the front of `buf`.
pub fn split_start(buf: &mut Bytes) -> Result<(), FrameError> {
    let n = buf.len().min(START_MAGIC.len());
    if n < START_MAGIC.len() || buf[..n] != START_MAGIC {
        return Err(FrameError::BadMagic {
            found: buf[..n].to_vec(),
        });
    }
    buf.advance(n);
    Ok(())
}

pub fn split_varint(buf: &mut Bytes) -> Result<u64, FrameError> {
    let mut value = 0u64;
    for i in 0..MAX_VARINT_LEN {
        if !buf.has_remaining() {
            return Err(FrameError::Truncated {
                expected: i as u64 + 1,
                available: i as u64,
            });
        }
        let byte = buf.get_u8();
        value = accumulate_varint(value, byte, i)?;
        if byte & 0x80 == 0 {
            return Ok(value);
        }
    }
    Err(FrameError::VarintOverflow)
}

/// Split one length-prefixed frame off the front of `buf` without copying.
pub fn split_length_prefixed(buf: &mut Bytes) -> Result<Bytes, FrameError> {
    let length = split_varint(buf)?;
    check_length(length)?;
    if (buf.len() as u64) < length {
        return Err(FrameError::Truncated {
            expected: length,
            available: buf.len() as u64,
        });
    }
    Ok(buf.split_to(length as usize))
}

/// Add the 7 payload bits of the `i`-th varint byte. The tenth byte only has
/// room for bit 63, so anything above 1 overflows.
fn accumulate_varint(value: u64, byte: u8, i: usize) -> Result<u64, FrameError> {
    if i == MAX_VARINT_LEN - 1 && byte > 1 {
        return Err(FrameError::VarintOverflow);
    }
    Ok(value | u64::from(byte & 0x7f) << (7 * i))
}

fn encode_varint(mut value: u64, out: &mut [u8; MAX_VARINT_LEN]) -> usize {
    let mut n = 0;
    loop {
        let byte = (value & 0x7f) as u8;
        value >>= 7;
        if value == 0 {
            out[n] = byte;
            return n + 1;
        }
        out[n] = byte | 0x80;
        n += 1;
    }
}

fn read_varint_or_end<R: Read + ?Sized>(source: &mut R) -> Result<Option<u64>, FrameError> {
    let mut value = 0u64;
    for i in 0..MAX_VARINT_LEN {
        let mut byte = [0u8; 1];
        if read_up_to(source, &mut byte)? == 0 {
            if i == 0 {
                return Ok(None);
            }
            return Err(FrameError::Truncated {
                expected: i as u64 + 1,
                available: i as u64,
            });
        }
        value = accumulate_varint(value, byte[0], i)?;
        if byte[0] & 0x80 == 0 {
            return Ok(Some(value));
        }
    }
    Err(FrameError::VarintOverflow)
}

fn read_body<R: Read + ?Sized>(source: &mut R, length: u64) -> Result<Bytes, FrameError> {
    check_length(length)?;
    let mut body = Vec::with_capacity(length.min(64 * 1024) as usize);
    Read::take(&mut *source, length).read_to_end(&mut body)?;
    if (body.len() as u64) < length {
        return Err(FrameError::Truncated {
            expected: length,
            available: body.len() as u64,
        });
    }
    Ok(Bytes::from(body))
}

fn check_length(length: u64) -> Result<(), FrameError> {
    if length > MAX_FRAME_LEN {
        return Err(FrameError::TooLarge {
            length,
            limit: MAX_FRAME_LEN,
        });
    }
    Ok(())
}

/// Read until `buf` is full or the source ends; returns the count read.
fn read_up_to<R: Read + ?Sized>(source: &mut R, buf: &mut [u8]) -> std::io::Result<usize> {
    let mut filled = 0;
    while filled < buf.len() {
        match source.read(&mut buf[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(e) if e.kind() == ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        }
    }
    Ok(filled)
}
