use atlona::{AmpStatus, SwitcherState};
use comfy_table::{Attribute, Cell, ContentArrangement, Table};
use crossterm::style::Stylize;
use std::collections::BTreeMap;
use std::fmt::Display;

fn key_value_table(rows: Vec<(&str, String)>) -> Table {
    let mut table = Table::new();
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(vec![
        Cell::new("Field").add_attribute(Attribute::Bold),
        Cell::new("Value").add_attribute(Attribute::Bold),
    ]);
    for (field, value) in rows {
        table.add_row(vec![field.to_string(), value]);
    }
    table
}

pub fn display_switcher_state(address: &str, state: &SwitcherState) {
    let hdcp = state
        .hdcp_set
        .iter()
        .map(|v| v.to_string())
        .collect::<Vec<_>>()
        .join(", ");

    let table = key_value_table(vec![
        ("Input", state.inp.to_string()),
        ("Auto switch", on_off(state.asw != 0)),
        ("Auto switch delay", state.aswtime.to_string()),
        ("HDMI audio", state.hdmi_audio.to_string()),
        ("HDCP", hdcp),
        ("Preferred port", state.preport.to_string()),
        ("Login user", state.login_user.clone()),
    ]);

    println!("{}", format!("Switcher {}", address).cyan().bold());
    println!("{table}");
}

pub fn display_status(address: &str, status: &AmpStatus) {
    let table = key_value_table(vec![
        ("Model", status.model.clone()),
        ("Firmware", status.firmware.clone()),
        ("MAC address", status.mac_address.clone()),
        ("Serial number", status.serial_number.clone()),
        ("Operating time", status.operating_time.clone()),
    ]);

    println!("{}", format!("Amplifier {}", address).cyan().bold());
    println!("{table}");
}

/// One row per block
pub fn display_blocks<V: Display>(value_header: &str, values: &BTreeMap<String, V>) {
    if values.is_empty() {
        println!("{}", "No blocks requested.".yellow());
        return;
    }

    let mut table = Table::new();
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(vec![
        Cell::new("Block").add_attribute(Attribute::Bold),
        Cell::new(value_header).add_attribute(Attribute::Bold),
    ]);
    for (block, value) in values {
        table.add_row(vec![block.clone(), value.to_string()]);
    }

    println!("{table}");
}

pub fn on_off(value: bool) -> String {
    if value { "on" } else { "off" }.to_string()
}
