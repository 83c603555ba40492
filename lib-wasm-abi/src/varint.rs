//! LEB128-style variable-length integers.
//!
//! `varuint32` packs 7 bits per byte, least-significant group first, with the
//! high bit as the continuation flag. `varint32` is the zig-zag mapping over
//! the unsigned form. These encodings carry the ABI's `varuint32`/`varint32`
//! built-ins and every dynamic length prefix (arrays, `bytes`, `string`).

use crate::abi::errors::{AbiError, AbiResult};
use crate::datastream::{DataStream, DataStreamMut};

/// A varuint32 never needs more than 5 groups of 7 bits.
const MAX_VARUINT32_BYTES: u32 = 5;

pub fn write_varuint32(ds: &mut DataStreamMut<'_>, mut value: u32) -> AbiResult<()> {
    loop {
        let mut byte = (value & 0x7f) as u8;
        value >>= 7;
        if value != 0 {
            byte |= 0x80;
        }
        ds.write_u8(byte)?;
        if value == 0 {
            return Ok(());
        }
    }
}

pub fn read_varuint32(ds: &mut DataStream<'_>) -> AbiResult<u32> {
    let mut value: u64 = 0;
    let mut shift: u32 = 0;
    loop {
        if shift >= MAX_VARUINT32_BYTES * 7 {
            return Err(AbiError::Unpack(
                "varuint32 is longer than 5 bytes".to_string(),
            ));
        }
        let byte = ds.read_u8()?;
        value |= u64::from(byte & 0x7f) << shift;
        if byte & 0x80 == 0 {
            break;
        }
        shift += 7;
    }
    u32::try_from(value)
        .map_err(|_| AbiError::Unpack("varuint32 overflows 32 bits".to_string()))
}

pub fn write_varint32(ds: &mut DataStreamMut<'_>, value: i32) -> AbiResult<()> {
    // zig-zag: small magnitudes of either sign stay short on the wire
    write_varuint32(ds, ((value << 1) ^ (value >> 31)) as u32)
}

pub fn read_varint32(ds: &mut DataStream<'_>) -> AbiResult<i32> {
    let raw = read_varuint32(ds)?;
    Ok((raw >> 1) as i32 ^ -((raw & 1) as i32))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn encode_u(value: u32) -> Vec<u8> {
        let mut buf = [0u8; 8];
        let mut ds = DataStreamMut::new(&mut buf);
        write_varuint32(&mut ds, value).unwrap();
        let len = ds.tellp();
        buf[..len].to_vec()
    }

    fn decode_u(bytes: &[u8]) -> AbiResult<u32> {
        read_varuint32(&mut DataStream::new(bytes))
    }

    #[test]
    fn varuint32_known_encodings() {
        assert_eq!(encode_u(0), [0x00]);
        assert_eq!(encode_u(1), [0x01]);
        assert_eq!(encode_u(127), [0x7f]);
        assert_eq!(encode_u(128), [0x80, 0x01]);
        assert_eq!(encode_u(300), [0xac, 0x02]);
        assert_eq!(encode_u(u32::MAX), [0xff, 0xff, 0xff, 0xff, 0x0f]);
    }

    #[test]
    fn varuint32_round_trip_edges() {
        for value in [0, 1, 127, 128, 16383, 16384, u32::MAX - 1, u32::MAX] {
            assert_eq!(decode_u(&encode_u(value)).unwrap(), value);
        }
    }

    #[test]
    fn varuint32_rejects_overlong() {
        // six continuation groups
        let overlong = [0x80, 0x80, 0x80, 0x80, 0x80, 0x01];
        assert!(matches!(decode_u(&overlong), Err(AbiError::Unpack(_))));
        // five groups but bits beyond the 32nd set
        let overflow = [0xff, 0xff, 0xff, 0xff, 0x7f];
        assert!(matches!(decode_u(&overflow), Err(AbiError::Unpack(_))));
    }

    #[test]
    fn varuint32_truncated_stream() {
        assert!(matches!(
            decode_u(&[0x80]),
            Err(AbiError::StreamOverflow { .. })
        ));
    }

    #[test]
    fn varint32_zig_zag() {
        let cases = [
            (0i32, vec![0x00u8]),
            (-1, vec![0x01]),
            (1, vec![0x02]),
            (-2, vec![0x03]),
            (2147483647, vec![0xfe, 0xff, 0xff, 0xff, 0x0f]),
            (-2147483648, vec![0xff, 0xff, 0xff, 0xff, 0x0f]),
        ];
        for (value, expected) in cases {
            let mut buf = [0u8; 8];
            let mut ds = DataStreamMut::new(&mut buf);
            write_varint32(&mut ds, value).unwrap();
            let len = ds.tellp();
            assert_eq!(&buf[..len], expected.as_slice(), "encode {value}");
            let decoded = read_varint32(&mut DataStream::new(&expected)).unwrap();
            assert_eq!(decoded, value, "decode {value}");
        }
    }
}
