use crate::codec::format_slave_list;
use serde::{Deserialize, Deserializer};
use serde_json::Value;
use std::fmt;

/// Deserialize a status field the way a browser would show it: strings as-is,
/// numbers and booleans in their JSON spelling
fn optional_text<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<Value>::deserialize(deserializer)?.map(|value| match value {
        Value::String(text) => text,
        other => other.to_string(),
    }))
}

/// Possibly partial response of `GET /api/get-device-info`
#[derive(Clone, Debug, Default, Deserialize, PartialEq, Eq)]
pub struct DeviceStatusSnapshot {
    #[serde(default, deserialize_with = "optional_text")]
    pub firmware_version: Option<String>,
    #[serde(default, deserialize_with = "optional_text")]
    pub mode: Option<String>,
    #[serde(default, deserialize_with = "optional_text")]
    pub device_ip: Option<String>,
    #[serde(default, deserialize_with = "optional_text")]
    pub gateway: Option<String>,
    #[serde(default, deserialize_with = "optional_text")]
    pub subnet: Option<String>,
    #[serde(default, deserialize_with = "optional_text")]
    pub mac_address: Option<String>,
    #[serde(default, deserialize_with = "optional_text")]
    pub server_mode: Option<String>,
    #[serde(default, deserialize_with = "optional_text")]
    pub ssid: Option<String>,
}

/// Possibly partial response of `GET /api/get-modbus-info`
#[derive(Clone, Debug, Default, Deserialize, PartialEq, Eq)]
pub struct ModbusStatusSnapshot {
    #[serde(default, deserialize_with = "optional_text")]
    pub modbus_ip: Option<String>,
    #[serde(default, deserialize_with = "optional_text")]
    pub port: Option<String>,
    #[serde(default)]
    pub slave_list: Option<Vec<i64>>,
}

/// Overwrite view fields present in the snapshot, keep the others.
/// Evaluates to true if any rendered value changed.
macro_rules! merge_fields {
    ($view:expr, $snapshot:expr, $($field:ident),+ $(,)?) => {{
        let mut changed = false;
        $(
            if let Some(value) = $snapshot.$field {
                changed |= $view.$field.as_ref() != Some(&value);
                $view.$field = Some(value);
            }
        )+
        changed
    }};
}

/// Last rendered device status
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct DeviceStatusView {
    pub firmware_version: Option<String>,
    pub mode: Option<String>,
    pub device_ip: Option<String>,
    pub gateway: Option<String>,
    pub subnet: Option<String>,
    pub mac_address: Option<String>,
    pub server_mode: Option<String>,
    pub ssid: Option<String>,
}

impl DeviceStatusView {
    /// Merge a snapshot into the view. Fields absent from the snapshot are never cleared.
    pub fn apply(&mut self, snapshot: DeviceStatusSnapshot) -> bool {
        merge_fields!(
            self,
            snapshot,
            firmware_version,
            mode,
            device_ip,
            gateway,
            subnet,
            mac_address,
            server_mode,
            ssid,
        )
    }
}

/// Last rendered Modbus status
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ModbusStatusView {
    pub modbus_ip: Option<String>,
    pub port: Option<String>,
    pub slave_list: Option<Vec<i64>>,
}

impl ModbusStatusView {
    /// Merge a snapshot into the view. Fields absent from the snapshot are never cleared.
    pub fn apply(&mut self, snapshot: ModbusStatusSnapshot) -> bool {
        merge_fields!(self, snapshot, modbus_ip, port, slave_list)
    }
}

fn or_placeholder(value: &Option<String>) -> &str {
    value.as_deref().unwrap_or("-")
}

impl fmt::Display for DeviceStatusView {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "firmware version: {}", or_placeholder(&self.firmware_version))?;
        writeln!(f, "mode:             {}", or_placeholder(&self.mode))?;
        writeln!(f, "device ip:        {}", or_placeholder(&self.device_ip))?;
        writeln!(f, "gateway:          {}", or_placeholder(&self.gateway))?;
        writeln!(f, "subnet:           {}", or_placeholder(&self.subnet))?;
        writeln!(f, "mac address:      {}", or_placeholder(&self.mac_address))?;
        writeln!(f, "server mode:      {}", or_placeholder(&self.server_mode))?;
        write!(f, "ssid:             {}", or_placeholder(&self.ssid))
    }
}

impl fmt::Display for ModbusStatusView {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "modbus ip:  {}", or_placeholder(&self.modbus_ip))?;
        writeln!(f, "port:       {}", or_placeholder(&self.port))?;
        match &self.slave_list {
            Some(list) => write!(f, "slave list: {}", format_slave_list(list)),
            None => write!(f, "slave list: -"),
        }
    }
}
