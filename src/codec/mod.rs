// SPDX-FileCopyrightText: Copyright (c) 2017-2025 slowtec GmbH <post@slowtec.de>
// SPDX-License-Identifier: MIT OR Apache-2.0

use crate::{
    frame::{packed_coils_len, Coil, Request},
    PduBuffer, Result,
};

pub(crate) mod rtu;

#[allow(clippy::cast_possible_truncation)]
fn u16_len(len: usize) -> u16 {
    // This type conversion should always be safe, because either
    // the caller is responsible to pass a valid usize or the
    // possible values are limited by the protocol.
    debug_assert!(len <= u16::MAX.into());
    len as u16
}

#[allow(clippy::cast_possible_truncation)]
fn u8_len(len: usize) -> u8 {
    // This type conversion should always be safe, because either
    // the caller is responsible to pass a valid usize or the
    // possible values are limited by the protocol.
    debug_assert!(len <= u8::MAX.into());
    len as u8
}

/// Encodes a validated request into the PDU buffer.
///
/// The buffer is resized to the exact request size, so no bytes of a
/// previous PDU remain visible.
pub(crate) fn encode_request_pdu(pdu: &mut PduBuffer, request: &Request<'_>) -> Result<()> {
    use crate::frame::Request::*;

    pdu.set_size(request.pdu_size())?;
    pdu.write_u8(0, request.function_code().value());
    match request {
        ReadCoils(address, quantity)
        | ReadDiscreteInputs(address, quantity)
        | ReadInputRegisters(address, quantity)
        | ReadHoldingRegisters(address, quantity) => {
            pdu.write_u16(1, *address);
            pdu.write_u16(3, *quantity);
        }
        WriteSingleCoil(address, state) => {
            pdu.write_u16(1, *address);
            pdu.write_u16(3, bool_to_coil(*state));
        }
        WriteSingleRegister(address, word) => {
            pdu.write_u16(1, *address);
            pdu.write_u16(3, *word);
        }
        WriteMultipleCoils(address, coils) => {
            pdu.write_u16(1, *address);
            pdu.write_u16(3, u16_len(coils.len()));
            pdu.write_u8(5, u8_len(packed_coils_len(coils.len())));
            for (i, packed) in coils.chunks(8).map(pack_coils).enumerate() {
                pdu.write_u8(6 + i, packed);
            }
        }
        WriteMultipleRegisters(address, words) => {
            pdu.write_u16(1, *address);
            pdu.write_u16(3, u16_len(words.len()));
            pdu.write_u8(5, u8_len(words.len() * 2));
            for (i, word) in words.iter().enumerate() {
                pdu.write_u16(6 + i * 2, *word);
            }
        }
        Custom(_, data, _) => {
            for (i, byte) in data.iter().enumerate() {
                pdu.write_u8(1 + i, *byte);
            }
        }
    }
    Ok(())
}

fn bool_to_coil(state: bool) -> u16 {
    if state {
        0xFF00
    } else {
        0x0000
    }
}

/// Packs up to 8 coils into one byte, the first coil being the LSB.
fn pack_coils(coils: &[Coil]) -> u8 {
    debug_assert!(coils.len() <= 8);
    coils
        .iter()
        .enumerate()
        .fold(0, |packed, (i, coil)| packed | (u8::from(*coil) << i))
}

/// Extracts a single coil out of packed coil bytes.
pub(crate) fn unpack_coil(bytes: &[u8], offset: usize) -> Coil {
    (bytes[offset / 8] >> (offset % 8)) & 0b1 > 0
}

#[cfg(test)]
mod tests {
    use std::borrow::Cow;

    use super::*;

    fn encode(request: Request<'_>) -> Vec<u8> {
        let mut pdu = PduBuffer::new();
        encode_request_pdu(&mut pdu, &request).unwrap();
        pdu.as_bytes().to_vec()
    }

    #[test]
    fn convert_bool_to_coil() {
        assert_eq!(bool_to_coil(true), 0xFF00);
        assert_eq!(bool_to_coil(false), 0x0000);
    }

    #[test]
    fn pack_coils_into_byte() {
        assert_eq!(pack_coils(&[]), 0);
        assert_eq!(pack_coils(&[true]), 0b_1);
        assert_eq!(pack_coils(&[false]), 0b_0);
        assert_eq!(pack_coils(&[true, false]), 0b_01);
        assert_eq!(pack_coils(&[false, true]), 0b_10);
        assert_eq!(pack_coils(&[true, true]), 0b_11);
        assert_eq!(pack_coils(&[true; 8]), 0b_1111_1111);
        assert_eq!(pack_coils(&[false; 8]), 0);
    }

    #[test]
    fn unpack_coils_from_bytes() {
        assert!(unpack_coil(&[0b1], 0));
        assert!(!unpack_coil(&[0b10], 0));
        assert!(unpack_coil(&[0b10], 1));
        assert!(unpack_coil(&[0xff, 0b11], 9));
        assert!(!unpack_coil(&[0xff, 0b01], 9));
    }

    #[test]
    fn coil_packing_round_trip() {
        for len in [1, 2, 7, 8, 9, 15, 16, 17, 100, 1967, 1968] {
            let coils: Vec<Coil> = (0..len).map(|i| i % 3 == 0 || i % 7 == 1).collect();
            let bytes = encode(Request::WriteMultipleCoils(0, Cow::Borrowed(&coils)));
            assert_eq!(usize::from(bytes[5]), packed_coils_len(len));
            let packed = &bytes[6..];
            let unpacked: Vec<Coil> = (0..len).map(|i| unpack_coil(packed, i)).collect();
            assert_eq!(unpacked, coils);
        }
    }

    #[test]
    fn encode_read_request() {
        assert_eq!(
            encode(Request::ReadHoldingRegisters(0x082B, 2)),
            vec![0x03, 0x08, 0x2B, 0x00, 0x02]
        );
        assert_eq!(
            encode(Request::ReadCoils(0x0013, 0x0013)),
            vec![0x01, 0x00, 0x13, 0x00, 0x13]
        );
    }

    #[test]
    fn encode_write_single_coil() {
        assert_eq!(
            encode(Request::WriteSingleCoil(10, true)),
            vec![0x05, 0x00, 0x0A, 0xFF, 0x00]
        );
        assert_eq!(
            encode(Request::WriteSingleCoil(10, false)),
            vec![0x05, 0x00, 0x0A, 0x00, 0x00]
        );
    }

    #[test]
    fn encode_write_multiple_coils() {
        let coils = [true, false, true, true, false, false, true, true, true, false];
        assert_eq!(
            encode(Request::WriteMultipleCoils(0x0013, Cow::Borrowed(&coils))),
            vec![0x0F, 0x00, 0x13, 0x00, 0x0A, 0x02, 0xCD, 0x01]
        );
    }

    #[test]
    fn encode_write_multiple_registers() {
        assert_eq!(
            encode(Request::WriteMultipleRegisters(
                0x0001,
                Cow::Borrowed(&[0x000A, 0x0102])
            )),
            vec![0x10, 0x00, 0x01, 0x00, 0x02, 0x04, 0x00, 0x0A, 0x01, 0x02]
        );
    }

    #[test]
    #[allow(clippy::cast_sign_loss)]
    fn register_round_trip() {
        let values: Vec<i16> = vec![i16::MIN, -1, 0, 1, 200, 300, i16::MAX];
        let words: Vec<u16> = values.iter().map(|v| *v as u16).collect();
        let mut pdu = PduBuffer::new();
        encode_request_pdu(
            &mut pdu,
            &Request::WriteMultipleRegisters(0, Cow::Borrowed(&words)),
        )
        .unwrap();
        for (i, (value, word)) in values.iter().zip(&words).enumerate() {
            assert_eq!(pdu.read_i16(6 + i * 2), *value);
            assert_eq!(pdu.read_u16(6 + i * 2), *word);
        }
    }

    #[test]
    fn encode_custom_request() {
        assert_eq!(
            encode(Request::Custom(0x41, Cow::Borrowed(&[0x01, 0x02]), 3)),
            vec![0x41, 0x01, 0x02]
        );
    }

    #[test]
    fn shorter_request_hides_previous_bytes() {
        let mut pdu = PduBuffer::new();
        encode_request_pdu(
            &mut pdu,
            &Request::WriteMultipleRegisters(0, Cow::Borrowed(&[1, 2, 3])),
        )
        .unwrap();
        encode_request_pdu(&mut pdu, &Request::ReadCoils(0, 1)).unwrap();
        assert_eq!(pdu.as_bytes(), &[0x01, 0x00, 0x00, 0x00, 0x01]);
    }
}
