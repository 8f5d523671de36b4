use crate::{
    config::AppConfig,
    error::{ClientError, Result},
    http_client::{device_http_client, handle_http_response, progress_stream},
    types::{
        DeviceStatusSnapshot, FactoryResetKey, FactoryResetRequest, ModbusConfig,
        ModbusStatusSnapshot, NetworkConfig, ProgressFn, RestartRequest, SlaveSet, UploadEndpoint,
        UploadFile, UploadResponse,
    },
};
use log::{debug, info};
#[cfg(any(test, feature = "mock"))]
use mockall::automock;
use reqwest::{
    Body, Client, Url,
    multipart::{Form, Part},
};
use serde::{Serialize, de::DeserializeOwned};
use std::fmt::Debug;
use trait_variant::make;

/// HTTP API of the gateway device
#[make(Send)]
#[cfg_attr(any(test, feature = "mock"), automock)]
pub trait DeviceClient {
    async fn device_info(&self) -> Result<DeviceStatusSnapshot>;
    async fn modbus_info(&self) -> Result<ModbusStatusSnapshot>;
    async fn set_network(&self, config: NetworkConfig) -> Result<()>;
    async fn set_modbus(&self, config: ModbusConfig) -> Result<()>;
    async fn set_slave(&self, slave_set: SlaveSet) -> Result<()>;
    async fn restart(&self) -> Result<()>;
    async fn factory_reset(&self) -> Result<()>;
    /// Send an image to an upload endpoint. The answer is returned as is,
    /// whatever its status, for the upload controller to interpret.
    async fn upload(
        &self,
        endpoint: UploadEndpoint,
        file: UploadFile,
        progress: ProgressFn,
    ) -> Result<UploadResponse>;
}

#[derive(Clone)]
pub struct GatewayClient {
    client: Client,
    base_url: Url,
    factory_reset_key: FactoryResetKey,
    upload_field: String,
    chunk_size: usize,
}

impl GatewayClient {
    // API endpoint constants
    const DEVICE_INFO_ENDPOINT: &str = "/api/get-device-info";
    const MODBUS_INFO_ENDPOINT: &str = "/api/get-modbus-info";
    const SET_NETWORK_ENDPOINT: &str = "/api/set-network";
    const SET_MODBUS_ENDPOINT: &str = "/api/set-modbus";
    const SET_SLAVE_ENDPOINT: &str = "/api/set-slave";
    const RESTART_ENDPOINT: &str = "/api/restart";
    const FACTORY_RESET_ENDPOINT: &str = "/api/freset";

    pub fn new(config: &AppConfig) -> anyhow::Result<Self> {
        Ok(GatewayClient {
            client: device_http_client()?,
            base_url: config.device.base_url.clone(),
            factory_reset_key: config.actions.factory_reset_key,
            upload_field: config.upload.field_name.clone(),
            chunk_size: config.upload.chunk_size,
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn build_url(&self, path: &str) -> String {
        // Join with exactly one "/" whether or not the base carries a trailing one
        let base = self.base_url.as_str().trim_end_matches('/');
        let normalized_path = path.trim_start_matches('/');
        format!("{base}/{normalized_path}")
    }

    /// GET request returning the decoded JSON body
    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        let url = self.build_url(path);
        debug!("GET {url}");

        let res = self.client.get(&url).send().await?;
        let body = handle_http_response(res, &format!("GET {url}")).await?;

        serde_json::from_str(&body)
            .map_err(|e| ClientError::Decode(format!("GET {url}: {e}")))
    }

    /// POST request with JSON body
    async fn post_json(&self, path: &str, body: impl Debug + Serialize) -> Result<()> {
        let url = self.build_url(path);
        info!("POST {url} with body: {body:?}");

        let res = self.client.post(&url).json(&body).send().await?;
        handle_http_response(res, &format!("POST {url}")).await?;

        Ok(())
    }
}

impl DeviceClient for GatewayClient {
    async fn device_info(&self) -> Result<DeviceStatusSnapshot> {
        self.get_json(Self::DEVICE_INFO_ENDPOINT).await
    }

    async fn modbus_info(&self) -> Result<ModbusStatusSnapshot> {
        self.get_json(Self::MODBUS_INFO_ENDPOINT).await
    }

    async fn set_network(&self, config: NetworkConfig) -> Result<()> {
        self.post_json(Self::SET_NETWORK_ENDPOINT, config).await
    }

    async fn set_modbus(&self, config: ModbusConfig) -> Result<()> {
        self.post_json(Self::SET_MODBUS_ENDPOINT, config).await
    }

    async fn set_slave(&self, slave_set: SlaveSet) -> Result<()> {
        self.post_json(Self::SET_SLAVE_ENDPOINT, slave_set).await
    }

    async fn restart(&self) -> Result<()> {
        self.post_json(Self::RESTART_ENDPOINT, RestartRequest::default())
            .await
    }

    async fn factory_reset(&self) -> Result<()> {
        self.post_json(
            Self::FACTORY_RESET_ENDPOINT,
            FactoryResetRequest::from(self.factory_reset_key),
        )
        .await
    }

    async fn upload(
        &self,
        endpoint: UploadEndpoint,
        file: UploadFile,
        progress: ProgressFn,
    ) -> Result<UploadResponse> {
        let url = self.build_url(endpoint.path());
        info!(
            "POST {url} with {} ({} bytes)",
            file.file_name,
            file.content.len()
        );

        let len = file.content.len() as u64;
        let body = Body::wrap_stream(progress_stream(file.content, self.chunk_size, progress));
        let part = Part::stream_with_length(body, len).file_name(file.file_name);
        let form = Form::new().part(self.upload_field.clone(), part);

        let res = self.client.post(&url).multipart(form).send().await?;
        let status = res.status().as_u16();
        let body = res.text().await?;
        debug!("POST {url} answered {status}: {body}");

        Ok(UploadResponse { status, body })
    }
}
