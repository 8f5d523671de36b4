use crate::types::{ServerMode, WifiMode};

/// The four raw inputs of an IPv4 address, in order
pub type OctetInputs = [String; 4];

/// Split a dotted address as typed by the operator into four raw octet inputs
///
/// Missing octets become empty inputs and anything after the third dot stays
/// in the last input, so the validator sees exactly what was typed.
pub fn octet_inputs(dotted: &str) -> OctetInputs {
    let mut parts = dotted.trim().splitn(4, '.');
    std::array::from_fn(|_| parts.next().unwrap_or_default().to_string())
}

/// Field values of the network settings form
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NetworkForm {
    pub mode: WifiMode,
    pub server: ServerMode,
    pub ssid: String,
    pub password: String,
    pub ip: OctetInputs,
    pub gateway: OctetInputs,
    pub subnet: OctetInputs,
}

/// Field values of the Modbus settings form
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ModbusForm {
    pub port: String,
    pub ip: OctetInputs,
}

/// Free text of the slave list input, e.g. `1,3,5-8`
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SlaveListForm {
    pub slave_list: String,
}
