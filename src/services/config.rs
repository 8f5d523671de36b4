//! Configuration submission
//!
//! Each flow validates a form snapshot, encodes it into the request payload
//! and posts it once. A validation failure never reaches the network.

use crate::{
    codec::{decode_slave_list, encode_ipv4},
    device_client::DeviceClient,
    error::Result,
    types::{ModbusConfig, ModbusForm, NetworkConfig, NetworkForm, SlaveListForm, SlaveSet},
    validation::{
        Field, IpField, SLAVE_LIST_MESSAGE, ValidationError, validate_ipv4, validate_password,
        validate_port, validate_slave_list, validate_ssid,
    },
};
use log::info;

/// Service for network, Modbus and slave list configuration
pub struct ConfigService;

impl ConfigService {
    /// Validate the network form in field order and build the payload
    ///
    /// Checks run SSID, password, device IP, gateway, subnet and stop at the
    /// first failure.
    pub fn network_config(form: &NetworkForm) -> std::result::Result<NetworkConfig, ValidationError> {
        validate_ssid(&form.ssid)?;
        validate_password(&form.password)?;
        let ip = validate_ipv4(IpField::Device, &form.ip)?;
        let gateway = validate_ipv4(IpField::Gateway, &form.gateway)?;
        let subnet = validate_ipv4(IpField::Subnet, &form.subnet)?;

        Ok(NetworkConfig {
            mode: form.mode,
            server: form.server,
            ssid: form.ssid.clone(),
            password: form.password.clone(),
            ip: encode_ipv4(&ip),
            gateway: encode_ipv4(&gateway),
            subnet: encode_ipv4(&subnet),
        })
    }

    pub fn modbus_config(form: &ModbusForm) -> std::result::Result<ModbusConfig, ValidationError> {
        let ip = validate_ipv4(IpField::Modbus, &form.ip)?;
        let port = validate_port(&form.port)?;

        Ok(ModbusConfig {
            port,
            ip: encode_ipv4(&ip),
        })
    }

    pub fn slave_set(form: &SlaveListForm) -> std::result::Result<SlaveSet, ValidationError> {
        validate_slave_list(&form.slave_list)?;

        let ids = decode_slave_list(&form.slave_list);
        if ids.is_empty() {
            return Err(ValidationError::new(Field::SlaveList, SLAVE_LIST_MESSAGE));
        }
        Ok(SlaveSet::new(ids))
    }

    pub async fn submit_network<C: DeviceClient>(client: &C, form: &NetworkForm) -> Result<()> {
        let config = Self::network_config(form)?;
        client.set_network(config).await?;
        info!("network configuration saved");
        Ok(())
    }

    pub async fn submit_modbus<C: DeviceClient>(client: &C, form: &ModbusForm) -> Result<()> {
        let config = Self::modbus_config(form)?;
        client.set_modbus(config).await?;
        info!("modbus configuration saved");
        Ok(())
    }

    pub async fn submit_slaves<C: DeviceClient>(client: &C, form: &SlaveListForm) -> Result<()> {
        let slave_set = Self::slave_set(form)?;
        client.set_slave(slave_set).await?;
        info!("slave list saved");
        Ok(())
    }
}
