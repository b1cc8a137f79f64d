// SPDX-FileCopyrightText: Copyright (c) 2017-2025 slowtec GmbH <post@slowtec.de>
// SPDX-License-Identifier: MIT OR Apache-2.0

//! A simulated RTU server on the far end of an in-memory stream

#![allow(dead_code)]

use tokio::io::{AsyncReadExt as _, AsyncWriteExt as _, DuplexStream};

use modbus_rtu_master::{crc16, crc_valid, SlaveId};

/// What the simulated server puts on the line.
pub enum Reply {
    /// A response PDU, framed with the server id and CRC.
    Pdu(Vec<u8>),
    /// Bytes sent exactly as given.
    Raw(Vec<u8>),
    /// Nothing at all.
    Silence,
}

pub fn frame(server: SlaveId, pdu: &[u8]) -> Vec<u8> {
    let mut adu = Vec::with_capacity(pdu.len() + 3);
    adu.push(server);
    adu.extend_from_slice(pdu);
    adu.extend_from_slice(&crc16(&adu).to_le_bytes());
    adu
}

/// Answers request frames until the client hangs up.
///
/// Frames with an invalid checksum are ignored.
pub async fn serve<F>(mut stream: DuplexStream, mut handle: F)
where
    F: FnMut(SlaveId, &[u8]) -> Reply + Send,
{
    let mut buf = [0; 256];
    loop {
        let len = match stream.read(&mut buf).await {
            Ok(0) | Err(_) => return,
            Ok(len) => len,
        };
        if len < 4 || !crc_valid(&buf[..len], len - 2) {
            continue;
        }
        let reply = match handle(buf[0], &buf[1..len - 2]) {
            Reply::Pdu(pdu) => frame(buf[0], &pdu),
            Reply::Raw(bytes) => bytes,
            Reply::Silence => continue,
        };
        if stream.write_all(&reply).await.is_err() {
            return;
        }
    }
}

/// Register and coil memory of a simulated device.
#[derive(Debug, Clone)]
pub struct Device {
    pub id: SlaveId,
    pub coils: Vec<bool>,
    pub registers: Vec<u16>,
}

impl Device {
    pub fn new(id: SlaveId) -> Self {
        Self {
            id,
            coils: vec![false; 64],
            registers: vec![0; 64],
        }
    }

    /// Processes a request PDU like a real device would.
    pub fn handle(&mut self, server: SlaveId, req: &[u8]) -> Reply {
        if server != self.id {
            return Reply::Silence;
        }
        let function = req[0];
        if req.len() < 5 {
            return exception(function, 0x01);
        }
        let addr = usize::from(u16::from_be_bytes([req[1], req[2]]));
        let value = u16::from_be_bytes([req[3], req[4]]);
        match function {
            0x01 | 0x02 => {
                let cnt = usize::from(value);
                let Some(coils) = self.coils.get(addr..addr + cnt) else {
                    return exception(function, 0x02);
                };
                let mut packed = vec![0u8; (cnt + 7) / 8];
                for (i, _) in coils.iter().enumerate().filter(|(_, coil)| **coil) {
                    packed[i / 8] |= 1 << (i % 8);
                }
                let mut pdu = vec![function, packed.len() as u8];
                pdu.extend(packed);
                Reply::Pdu(pdu)
            }
            0x03 | 0x04 => {
                let cnt = usize::from(value);
                let Some(words) = self.registers.get(addr..addr + cnt) else {
                    return exception(function, 0x02);
                };
                let mut pdu = vec![function, (cnt * 2) as u8];
                pdu.extend(words.iter().flat_map(|word| word.to_be_bytes()));
                Reply::Pdu(pdu)
            }
            0x05 => {
                let Some(coil) = self.coils.get_mut(addr) else {
                    return exception(function, 0x02);
                };
                *coil = value == 0xFF00;
                Reply::Pdu(req.to_vec())
            }
            0x06 => {
                let Some(word) = self.registers.get_mut(addr) else {
                    return exception(function, 0x02);
                };
                *word = value;
                Reply::Pdu(req.to_vec())
            }
            0x0F => {
                let cnt = usize::from(value);
                let Some(coils) = self.coils.get_mut(addr..addr + cnt) else {
                    return exception(function, 0x02);
                };
                for (i, coil) in coils.iter_mut().enumerate() {
                    *coil = req[6 + i / 8] & (1 << (i % 8)) != 0;
                }
                Reply::Pdu(req[..5].to_vec())
            }
            0x10 => {
                let cnt = usize::from(value);
                let Some(words) = self.registers.get_mut(addr..addr + cnt) else {
                    return exception(function, 0x02);
                };
                for (i, word) in words.iter_mut().enumerate() {
                    *word = u16::from_be_bytes([req[6 + 2 * i], req[7 + 2 * i]]);
                }
                Reply::Pdu(req[..5].to_vec())
            }
            _ => exception(function, 0x01),
        }
    }
}

pub fn exception(function: u8, code: u8) -> Reply {
    Reply::Pdu(vec![function | 0x80, code])
}
