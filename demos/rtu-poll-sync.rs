// SPDX-FileCopyrightText: Copyright (c) 2017-2025 slowtec GmbH <post@slowtec.de>
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Synchronous RTU polling example

use std::{thread, time::Duration};

fn main() -> anyhow::Result<()> {
    use modbus_rtu_master::prelude::*;

    env_logger::init();

    let tty_path = "/dev/ttyUSB0";
    let slave = Slave(0x17);

    let serial = SerialConfig {
        baud_rate: 19200,
        ..Default::default()
    };
    let config = ClientConfig::default()
        .with_timeout(Duration::from_millis(500))
        .with_pause(Duration::from_millis(2));

    let mut client = sync::rtu::connect(tty_path, &serial, config)?;

    for _ in 0..10 {
        // A response replaces the request, so it is built for every poll.
        client.init_read_holding_registers(slave, 0x082B, 2)?;
        match client.execute()? {
            Outcome::Ok => {
                println!("Sensor value is: {:?}", client.response_registers()?);
            }
            outcome => println!("Polling failed: {outcome}"),
        }
        thread::sleep(Duration::from_secs(1));
    }

    client.close()?;
    Ok(())
}
