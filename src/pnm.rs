//! Netpbm greymap/pixmap reader and writer.
//!
//! Samples are returned exactly as stored. A file with `maxval = 4095` yields
//! 12-bit values in `0..=4095`; generic decoders stretch such files to the
//! full 16-bit range, which would shift every histogram bucket.
//!
//! Supported magics: `P2`/`P5` (greymap, 1 channel) and `P3`/`P6`
//! (pixmap, 3 channels). Binary samples wider than 8 bits are big-endian.

use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;

use log::debug;

use crate::error::{HistError, PnmError, Result};
use crate::raster::Raster;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Encoding {
    Plain,
    Binary,
}

/// Parsed `P?` header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PnmHeader {
    pub width: usize,
    pub height: usize,
    pub channels: usize,
    pub max_val: u16,
    encoding: Encoding,
}

impl PnmHeader {
    pub fn bytes_per_sample(&self) -> usize {
        if self.max_val > 255 { 2 } else { 1 }
    }

    pub fn is_binary(&self) -> bool {
        self.encoding == Encoding::Binary
    }
}

/// True if `bytes` starts with one of the supported Netpbm magic numbers.
pub fn is_pnm_magic(bytes: &[u8]) -> bool {
    matches!(bytes, [b'P', b'2' | b'3' | b'5' | b'6', ..])
}

struct Cursor<'a> {
    bytes: &'a [u8],
    pos: usize,
}

impl Cursor<'_> {
    fn skip_whitespace_and_comments(&mut self) {
        while let Some(&c) = self.bytes.get(self.pos) {
            match c {
                b' ' | b'\t' | b'\r' | b'\n' => self.pos += 1,
                b'#' => {
                    while let Some(&c) = self.bytes.get(self.pos) {
                        self.pos += 1;
                        if c == b'\n' {
                            break;
                        }
                    }
                }
                _ => break,
            }
        }
    }

    /// Reads the next unsigned decimal token, or `None` at end of input.
    fn next_uint(&mut self, what: &str) -> std::result::Result<Option<u32>, PnmError> {
        self.skip_whitespace_and_comments();
        let start = self.pos;
        while self.bytes.get(self.pos).is_some_and(u8::is_ascii_digit) {
            self.pos += 1;
        }
        if start == self.pos {
            return match self.bytes.get(self.pos) {
                None => Ok(None),
                Some(&c) => Err(PnmError::BadHeader(format!(
                    "unexpected byte 0x{c:02x} while reading {what}"
                ))),
            };
        }
        // Digits only, so the slice is valid UTF-8.
        let text = std::str::from_utf8(&self.bytes[start..self.pos]).unwrap_or_default();
        text.parse::<u32>()
            .map(Some)
            .map_err(|e| PnmError::BadHeader(format!("{what} {text:?}: {e}")))
    }

    fn require_uint(&mut self, what: &str) -> std::result::Result<u32, PnmError> {
        self.next_uint(what)?
            .ok_or_else(|| PnmError::BadHeader(format!("missing {what}")))
    }
}

fn parse_header(cursor: &mut Cursor<'_>) -> std::result::Result<PnmHeader, PnmError> {
    let magic = match cursor.bytes {
        [a, b, ..] => [*a, *b],
        [a] => return Err(PnmError::BadMagic([*a, 0])),
        [] => return Err(PnmError::BadMagic([0, 0])),
    };
    let (channels, encoding) = match &magic {
        b"P2" => (1, Encoding::Plain),
        b"P3" => (3, Encoding::Plain),
        b"P5" => (1, Encoding::Binary),
        b"P6" => (3, Encoding::Binary),
        _ => return Err(PnmError::BadMagic(magic)),
    };
    cursor.pos = 2;

    let width = cursor.require_uint("width")? as usize;
    let height = cursor.require_uint("height")? as usize;
    let max_val = cursor.require_uint("maxval")?;
    let max_val = match u16::try_from(max_val) {
        Ok(v) if v > 0 => v,
        _ => return Err(PnmError::BadMaxval(max_val)),
    };

    if encoding == Encoding::Binary {
        // A single whitespace byte separates the header from the raster.
        match cursor.bytes.get(cursor.pos) {
            Some(b' ' | b'\t' | b'\r' | b'\n') => cursor.pos += 1,
            Some(&c) => {
                return Err(PnmError::BadHeader(format!(
                    "expected whitespace after maxval, found 0x{c:02x}"
                )));
            }
            None => {}
        }
    }

    Ok(PnmHeader {
        width,
        height,
        channels,
        max_val,
        encoding,
    })
}

fn check_sample(index: usize, value: u32, max_val: u16) -> std::result::Result<u16, PnmError> {
    if value > u32::from(max_val) {
        return Err(PnmError::SampleOutOfRange {
            index,
            value,
            max_val,
        });
    }
    Ok(value as u16)
}

fn read_binary(
    data: &[u8],
    header: &PnmHeader,
    expected: usize,
) -> std::result::Result<Vec<u16>, PnmError> {
    let bps = header.bytes_per_sample();
    let needed = expected.checked_mul(bps).ok_or_else(|| {
        PnmError::BadHeader(format!(
            "{}x{} raster is too large",
            header.width, header.height
        ))
    })?;
    if data.len() < needed {
        return Err(PnmError::TruncatedData {
            expected,
            found: data.len() / bps,
        });
    }

    let data = &data[..needed];
    let mut samples = Vec::with_capacity(expected);
    if bps == 1 {
        for (i, &b) in data.iter().enumerate() {
            samples.push(check_sample(i, u32::from(b), header.max_val)?);
        }
    } else {
        for (i, pair) in data.chunks_exact(2).enumerate() {
            let v = u16::from_be_bytes([pair[0], pair[1]]);
            samples.push(check_sample(i, u32::from(v), header.max_val)?);
        }
    }
    Ok(samples)
}

fn read_plain(
    cursor: &mut Cursor<'_>,
    header: &PnmHeader,
    expected: usize,
) -> std::result::Result<Vec<u16>, PnmError> {
    let mut samples = Vec::with_capacity(expected);
    for i in 0..expected {
        let Some(v) = cursor.next_uint("sample")? else {
            return Err(PnmError::TruncatedData { expected, found: i });
        };
        samples.push(check_sample(i, v, header.max_val)?);
    }
    Ok(samples)
}

/// Reads only the header of a PNM stream.
pub fn read_header(bytes: &[u8]) -> Result<PnmHeader> {
    let mut cursor = Cursor { bytes, pos: 0 };
    Ok(parse_header(&mut cursor)?)
}

/// Decodes a complete PNM stream into a [`Raster`].
pub fn decode_pnm(bytes: &[u8]) -> Result<Raster> {
    let mut cursor = Cursor { bytes, pos: 0 };
    let header = parse_header(&mut cursor)?;
    let expected = header
        .width
        .checked_mul(header.height)
        .and_then(|n| n.checked_mul(header.channels))
        .ok_or_else(|| {
            PnmError::BadHeader(format!(
                "{}x{} raster is too large",
                header.width, header.height
            ))
        })?;

    debug!(
        "pnm header: {}x{}x{} maxval={} binary={}",
        header.width,
        header.height,
        header.channels,
        header.max_val,
        header.is_binary()
    );

    let samples = match header.encoding {
        Encoding::Binary => read_binary(&bytes[cursor.pos..], &header, expected)?,
        Encoding::Plain => read_plain(&mut cursor, &header, expected)?,
    };

    Raster::new(
        header.width,
        header.height,
        header.channels,
        header.max_val,
        samples,
    )
}

/// Writes `raster` as binary `P5` (1 channel) or `P6` (3 channels).
pub fn write_pnm<W: Write>(raster: &Raster, mut out: W) -> io::Result<()> {
    let magic = match raster.channels() {
        1 => "P5",
        3 => "P6",
        n => {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("pnm supports 1 or 3 channels, raster has {n}"),
            ));
        }
    };
    write!(
        out,
        "{magic}\n{} {}\n{}\n",
        raster.width(),
        raster.height(),
        raster.max_val()
    )?;

    if raster.max_val() > 255 {
        let mut buf = Vec::with_capacity(raster.sample_count() * 2);
        for &v in raster.samples() {
            buf.extend_from_slice(&v.to_be_bytes());
        }
        out.write_all(&buf)?;
    } else {
        let buf: Vec<u8> = raster.samples().iter().map(|&v| v as u8).collect();
        out.write_all(&buf)?;
    }
    out.flush()
}

/// Writes `raster` to `path`, creating parent directories as needed.
pub fn save_pnm(raster: &Raster, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent).map_err(|e| HistError::io(parent, e))?;
    }
    let file = File::create(path).map_err(|e| HistError::io(path, e))?;
    write_pnm(raster, BufWriter::new(file)).map_err(|e| HistError::io(path, e))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_header_with_comments_and_mixed_whitespace() {
        let bytes = b"P6\n# created by scanner\n3\t2 # trailing\r\n4095\n";
        let header = read_header(bytes).unwrap();
        assert_eq!(header.width, 3);
        assert_eq!(header.height, 2);
        assert_eq!(header.channels, 3);
        assert_eq!(header.max_val, 4095);
        assert_eq!(header.bytes_per_sample(), 2);
        assert!(header.is_binary());
    }

    #[test]
    fn decodes_16bit_big_endian_without_rescaling() {
        let mut bytes = b"P5 2 1 4095\n".to_vec();
        bytes.extend_from_slice(&[0x0F, 0xFF, 0x01, 0x02]);
        let raster = decode_pnm(&bytes).unwrap();
        assert_eq!(raster.samples(), &[4095, 0x0102]);
        assert_eq!(raster.bit_depth(), 12);
    }

    #[test]
    fn decodes_8bit_pixmap() {
        let mut bytes = b"P6\n1 2\n255\n".to_vec();
        bytes.extend_from_slice(&[1, 2, 3, 4, 5, 6]);
        let raster = decode_pnm(&bytes).unwrap();
        assert_eq!(raster.channels(), 3);
        assert_eq!(raster.sample(1, 0, 2), Some(6));
    }

    #[test]
    fn decodes_plain_greymap() {
        let raster = decode_pnm(b"P2\n2 2\n15\n0 15\n# mid\n7 8\n").unwrap();
        assert_eq!(raster.samples(), &[0, 15, 7, 8]);
        assert_eq!(raster.max_val(), 15);
    }

    #[test]
    fn binary_data_may_start_with_whitespace_valued_bytes() {
        let mut bytes = b"P5 2 1 255\n".to_vec();
        bytes.extend_from_slice(&[b'\n', b' ']);
        let raster = decode_pnm(&bytes).unwrap();
        assert_eq!(raster.samples(), &[10, 32]);
    }

    #[test]
    fn truncated_binary_data_is_reported() {
        let mut bytes = b"P5 2 2 255\n".to_vec();
        bytes.extend_from_slice(&[1, 2, 3]);
        match decode_pnm(&bytes) {
            Err(HistError::Pnm(PnmError::TruncatedData { expected, found })) => {
                assert_eq!(expected, 4);
                assert_eq!(found, 3);
            }
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[test]
    fn sample_above_maxval_is_rejected() {
        let mut bytes = b"P5 1 1 1000\n".to_vec();
        bytes.extend_from_slice(&1001u16.to_be_bytes());
        assert!(matches!(
            decode_pnm(&bytes),
            Err(HistError::Pnm(PnmError::SampleOutOfRange { value: 1001, .. }))
        ));
    }

    #[test]
    fn rejects_unknown_magic_and_bad_maxval() {
        assert!(matches!(
            decode_pnm(b"P4 1 1\n\0"),
            Err(HistError::Pnm(PnmError::BadMagic(_)))
        ));
        assert!(matches!(
            decode_pnm(b"P5 1 1 70000\n\0\0"),
            Err(HistError::Pnm(PnmError::BadMaxval(70000)))
        ));
        assert!(matches!(
            decode_pnm(b"P5 1 1 0\n\0"),
            Err(HistError::Pnm(PnmError::BadMaxval(0)))
        ));
        assert!(matches!(
            decode_pnm(b"P5 1 x 255\n"),
            Err(HistError::Pnm(PnmError::BadHeader(_)))
        ));
    }

    #[test]
    fn writer_output_decodes_to_the_same_raster() {
        let raster = Raster::new(2, 1, 3, 4095, vec![0, 1, 2, 4093, 4094, 4095]).unwrap();
        let mut buf = Vec::new();
        write_pnm(&raster, &mut buf).unwrap();
        assert!(buf.starts_with(b"P6\n2 1\n4095\n"));
        assert_eq!(decode_pnm(&buf).unwrap(), raster);
    }

    #[test]
    fn writer_rejects_alpha_rasters() {
        let raster = Raster::new(1, 1, 4, 255, vec![0; 4]).unwrap();
        assert!(write_pnm(&raster, Vec::new()).is_err());
    }
}
