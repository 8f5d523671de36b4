use crate::{device_client::DeviceClient, error::Result};
use log::info;

/// Reboot and factory reset of the device
pub struct DeviceActionService;

impl DeviceActionService {
    pub async fn reboot<C: DeviceClient>(client: &C) -> Result<()> {
        client.restart().await?;
        info!("reboot requested");
        Ok(())
    }

    /// Request a factory reset. The device erases its configuration and
    /// restarts in access-point mode.
    pub async fn factory_reset<C: DeviceClient>(client: &C) -> Result<()> {
        client.factory_reset().await?;
        info!("factory reset requested");
        Ok(())
    }
}
