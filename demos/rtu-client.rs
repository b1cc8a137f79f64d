// SPDX-FileCopyrightText: Copyright (c) 2017-2025 slowtec GmbH <post@slowtec.de>
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Asynchronous RTU client example

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    use modbus_rtu_master::prelude::*;

    env_logger::init();

    let tty_path = "/dev/ttyUSB0";
    let slave = Slave(0x17);

    let transport = SerialTransport::open(tty_path, &SerialConfig::default())?;
    let mut client = Client::new(transport, ClientConfig::default());

    println!("Switching on coil 0x10");
    client.init_write_single_coil(slave, 0x10, true)?;
    let outcome = client.execute().await?;
    println!("{outcome}");

    println!("Reading a sensor value");
    client.init_read_input_registers(slave, 0x082B, 2)?;
    if client.execute().await?.is_ok() {
        println!("Sensor value is: {:?}", client.response_registers()?);
    } else if let Some(description) = client.outcome_description() {
        println!("Reading failed: {description}");
    }

    client.close().await?;
    Ok(())
}
