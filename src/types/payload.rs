use serde::{Deserialize, Serialize};
use serde_repr::{Deserialize_repr, Serialize_repr};
use std::{fmt, str::FromStr};

/// Wi-Fi operating mode of the gateway
#[derive(
    Clone, Copy, Debug, Default, Deserialize_repr, PartialEq, Eq, Serialize_repr, clap::ValueEnum,
)]
#[repr(u8)]
pub enum WifiMode {
    #[default]
    Ap = 1,
    Station = 2,
    ApStation = 3,
}

/// How the gateway obtains its address
#[derive(
    Clone, Copy, Debug, Default, Deserialize_repr, PartialEq, Eq, Serialize_repr, clap::ValueEnum,
)]
#[repr(u8)]
pub enum ServerMode {
    Static = 1,
    #[default]
    Dhcp = 2,
}

/// Body of `POST /api/set-network`
#[derive(Clone, Deserialize, PartialEq, Eq, Serialize)]
pub struct NetworkConfig {
    pub mode: WifiMode,
    pub server: ServerMode,
    pub ssid: String,
    pub password: String,
    pub ip: String,
    pub gateway: String,
    pub subnet: String,
}

// request bodies are logged, the password must not be
impl fmt::Debug for NetworkConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NetworkConfig")
            .field("mode", &self.mode)
            .field("server", &self.server)
            .field("ssid", &self.ssid)
            .field("password", &"********")
            .field("ip", &self.ip)
            .field("gateway", &self.gateway)
            .field("subnet", &self.subnet)
            .finish()
    }
}

/// Body of `POST /api/set-modbus`
#[derive(Clone, Debug, Deserialize, PartialEq, Eq, Serialize)]
pub struct ModbusConfig {
    pub port: u16,
    pub ip: String,
}

/// Body of `POST /api/set-slave`
#[derive(Clone, Debug, Deserialize, PartialEq, Eq, Serialize)]
pub struct SlaveSet {
    /// The device ignores `slave_list` unless this flag is positive
    slave_set: u8,
    pub slave_list: Vec<u8>,
}

impl SlaveSet {
    pub fn new(slave_list: Vec<u8>) -> Self {
        Self {
            slave_set: 1,
            slave_list,
        }
    }
}

/// Body of `POST /api/restart`
#[derive(Clone, Debug, Serialize)]
pub struct RestartRequest {
    restart: u8,
}

impl Default for RestartRequest {
    fn default() -> Self {
        Self { restart: 1 }
    }
}

/// Key the device firmware expects in a factory reset request
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum FactoryResetKey {
    #[default]
    Freset,
    FactoryReset,
}

impl FromStr for FactoryResetKey {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "freset" => Ok(Self::Freset),
            "factory_reset" => Ok(Self::FactoryReset),
            other => Err(format!(
                "unknown factory reset key '{other}', expected 'freset' or 'factory_reset'"
            )),
        }
    }
}

/// Body of `POST /api/freset`, serialized as `{"freset":1}` or `{"factory_reset":1}`
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FactoryResetRequest {
    Freset(u8),
    FactoryReset(u8),
}

impl From<FactoryResetKey> for FactoryResetRequest {
    fn from(key: FactoryResetKey) -> Self {
        match key {
            FactoryResetKey::Freset => Self::Freset(1),
            FactoryResetKey::FactoryReset => Self::FactoryReset(1),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    mod serialization {
        use super::*;

        #[test]
        fn network_config_uses_integer_enums() {
            let config = NetworkConfig {
                mode: WifiMode::ApStation,
                server: ServerMode::Static,
                ssid: "gateway-ssid".to_string(),
                password: "secret-pass".to_string(),
                ip: "192.168.2.10".to_string(),
                gateway: "192.168.2.1".to_string(),
                subnet: "255.255.255.0".to_string(),
            };

            assert_eq!(
                serde_json::to_value(&config).unwrap(),
                json!({
                    "mode": 3,
                    "server": 1,
                    "ssid": "gateway-ssid",
                    "password": "secret-pass",
                    "ip": "192.168.2.10",
                    "gateway": "192.168.2.1",
                    "subnet": "255.255.255.0",
                })
            );
        }

        #[test]
        fn network_config_debug_hides_password() {
            let config = NetworkConfig {
                mode: WifiMode::Ap,
                server: ServerMode::Dhcp,
                ssid: "gateway-ssid".to_string(),
                password: "secret-pass".to_string(),
                ip: "0.0.0.0".to_string(),
                gateway: "0.0.0.0".to_string(),
                subnet: "0.0.0.0".to_string(),
            };

            let debug = format!("{config:?}");
            assert!(!debug.contains("secret-pass"));
            assert!(debug.contains("gateway-ssid"));
        }

        #[test]
        fn slave_set_carries_set_flag() {
            assert_eq!(
                serde_json::to_value(SlaveSet::new(vec![3, 1, 2])).unwrap(),
                json!({ "slave_set": 1, "slave_list": [3, 1, 2] })
            );
        }

        #[test]
        fn restart_request_body() {
            assert_eq!(
                serde_json::to_value(RestartRequest::default()).unwrap(),
                json!({ "restart": 1 })
            );
        }

        #[test]
        fn factory_reset_body_follows_key() {
            assert_eq!(
                serde_json::to_value(FactoryResetRequest::from(FactoryResetKey::Freset)).unwrap(),
                json!({ "freset": 1 })
            );
            assert_eq!(
                serde_json::to_value(FactoryResetRequest::from(FactoryResetKey::FactoryReset))
                    .unwrap(),
                json!({ "factory_reset": 1 })
            );
        }
    }

    #[test]
    fn parses_factory_reset_key() {
        assert_eq!(
            "freset".parse::<FactoryResetKey>(),
            Ok(FactoryResetKey::Freset)
        );
        assert_eq!(
            " factory_reset ".parse::<FactoryResetKey>(),
            Ok(FactoryResetKey::FactoryReset)
        );
        assert!("reset".parse::<FactoryResetKey>().is_err());
    }
}
