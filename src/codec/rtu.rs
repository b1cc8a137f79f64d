// SPDX-FileCopyrightText: Copyright (c) 2017-2025 slowtec GmbH <post@slowtec.de>
// SPDX-License-Identifier: MIT OR Apache-2.0

use byteorder::{ByteOrder as _, LittleEndian};
use bytes::{BufMut as _, BytesMut};

use crate::{SlaveId, MAX_PDU_SIZE};

/// Maximum size of an RTU frame: server id, PDU and CRC.
pub(crate) const MAX_ADU_SIZE: usize = 1 + MAX_PDU_SIZE + 2;

/// Size of the checksum trailer.
pub(crate) const CRC_SIZE: usize = 2;

/// Calculates the _Modbus_ RTU checksum (CRC-16/MODBUS).
///
/// Initial value `0xFFFF`, reflected polynomial `0xA001`, no final XOR.
/// The checksum is transmitted little-endian, i.e. low byte first.
#[must_use]
pub fn crc16(data: &[u8]) -> u16 {
    let mut crc = 0xFFFF;
    for x in data {
        crc ^= u16::from(*x);
        for _ in 0..8 {
            if (crc & 0x0001) != 0 {
                crc >>= 1;
                crc ^= 0xA001;
            } else {
                crc >>= 1;
            }
        }
    }
    crc
}

/// Reads the checksum that trails the first `size` bytes of `frame`.
pub(crate) fn received_crc(frame: &[u8], size: usize) -> u16 {
    LittleEndian::read_u16(&frame[size..size + CRC_SIZE])
}

/// Checks that the 2 bytes following the first `size` bytes of `frame`
/// contain the checksum of these bytes.
///
/// Returns `false` if `frame` is too short to contain the checksum.
#[must_use]
pub fn crc_valid(frame: &[u8], size: usize) -> bool {
    frame.len() >= size + CRC_SIZE && crc16(&frame[..size]) == received_crc(frame, size)
}

/// Writes the complete request frame `[server id | PDU | CRC]`.
pub(crate) fn encode_request_adu(buf: &mut BytesMut, server: SlaveId, pdu: &[u8]) {
    buf.clear();
    buf.reserve(1 + pdu.len() + CRC_SIZE);
    buf.put_u8(server);
    buf.put_slice(pdu);
    let crc = crc16(&buf[..]);
    buf.put_u16_le(crc);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_calc_crc() {
        let msg = vec![0x01, 0x03, 0x08, 0x2B, 0x00, 0x02];
        assert_eq!(crc16(&msg), 0x63B6);

        let msg = vec![0x01, 0x03, 0x04, 0x00, 0x20, 0x00, 0x00];
        assert_eq!(crc16(&msg), 0xF9FB);

        let msg = vec![0x66, 0x82, 0x03];
        assert_eq!(crc16(&msg), 0x7EB1);
    }

    #[test]
    fn crc_of_empty_input_is_the_seed() {
        assert_eq!(crc16(&[]), 0xFFFF);
    }

    #[test]
    fn validate_crc() {
        let frame = [0x01, 0x03, 0x04, 0x89, 0x02, 0x42, 0xC7, 0x00, 0x9D];
        assert!(crc_valid(&frame, 7));
        assert_eq!(received_crc(&frame, 7), 0x9D00);

        let mut corrupted = frame;
        corrupted[4] ^= 0x01;
        assert!(!crc_valid(&corrupted, 7));

        let mut swapped = frame;
        swapped.swap(7, 8);
        assert!(!crc_valid(&swapped, 7));
    }

    #[test]
    fn validate_crc_of_short_frame() {
        assert!(!crc_valid(&[0x01, 0x03, 0x04], 2));
        assert!(!crc_valid(&[], 0));
    }

    #[test]
    fn crc_valid_accepts_exactly_the_computed_checksum() {
        let content = [0x11, 0x22, 0x33, 0x44];
        let crc = crc16(&content);
        for candidate in 0..=u16::MAX {
            let mut frame = content.to_vec();
            frame.extend_from_slice(&candidate.to_le_bytes());
            assert_eq!(crc_valid(&frame, content.len()), candidate == crc);
        }
    }

    #[test]
    fn encode_read_request() {
        let mut buf = BytesMut::new();
        encode_request_adu(&mut buf, 0x01, &[0x03, 0x08, 0x2B, 0x00, 0x02]);
        assert_eq!(
            &buf[..],
            &[0x01, 0x03, 0x08, 0x2B, 0x00, 0x02, 0xB6, 0x63]
        );
    }

    #[test]
    fn encode_replaces_previous_frame() {
        let mut buf = BytesMut::new();
        encode_request_adu(&mut buf, 0x01, &[0x03, 0x08, 0x2B, 0x00, 0x02]);
        encode_request_adu(&mut buf, 0x01, &[0x03, 0x00, 0x00, 0x00, 0x02]);
        assert_eq!(
            &buf[..],
            &[0x01, 0x03, 0x00, 0x00, 0x00, 0x02, 0xC4, 0x0B]
        );
    }
}
