use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use env_logger::{Builder, Env, Target};
use gateway_ui::{
    config::AppConfig,
    device_client::{DeviceClient, GatewayClient},
    services::{
        config::ConfigService,
        device::DeviceActionService,
        firmware::{UploadController, UploadView},
        status::StatusSynchronizer,
    },
    types::{
        DeviceStatusView, ModbusForm, ModbusStatusView, NetworkForm, ServerMode, SlaveListForm,
        UploadFile, UploadState, UploadTarget, WifiMode, octet_inputs,
    },
};
use log::{debug, error, info, warn};
use std::{
    io::Write,
    path::PathBuf,
    sync::{
        Arc,
        atomic::{AtomicU8, Ordering},
    },
};

/// Control client for Wi-Fi/Modbus gateways
#[derive(Parser)]
#[command(version, about)]
struct Cli {
    /// Base URL of the gateway, overrides GATEWAY_URL
    #[arg(long, global = true)]
    url: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Show device and Modbus status until interrupted
    Status,
    /// Submit the Wi-Fi and address configuration
    SetNetwork {
        #[arg(long, value_enum, default_value_t)]
        mode: WifiMode,
        #[arg(long, value_enum, default_value_t)]
        server: ServerMode,
        #[arg(long)]
        ssid: String,
        #[arg(long, env = "GATEWAY_WIFI_PASSWORD", hide_env_values = true)]
        password: String,
        /// Device address, e.g. 192.168.2.20
        #[arg(long)]
        ip: String,
        #[arg(long)]
        gateway: String,
        #[arg(long)]
        subnet: String,
    },
    /// Submit the Modbus TCP server address and port
    SetModbus {
        #[arg(long)]
        ip: String,
        #[arg(long)]
        port: String,
    },
    /// Submit the Modbus slave IDs, e.g. 1,3,5-8
    SetSlaves { slave_list: String },
    /// Restart the device
    Reboot,
    /// Reset the device to factory settings
    FactoryReset,
    /// Upload a firmware or filesystem image, `.zz` files are sent compressed
    Upload {
        #[arg(long, value_enum, default_value_t)]
        target: UploadTarget,
        file: Option<PathBuf>,
    },
}

/// Upload view printing progress in whole percent steps
struct ConsoleUploadView {
    last_percent: AtomicU8,
}

impl ConsoleUploadView {
    const NONE: u8 = u8::MAX;

    fn new() -> Self {
        Self {
            last_percent: AtomicU8::new(Self::NONE),
        }
    }
}

impl UploadView for ConsoleUploadView {
    fn set_progress_visible(&self, visible: bool) {
        if visible {
            self.last_percent.store(Self::NONE, Ordering::Relaxed);
        }
    }

    fn set_submit_enabled(&self, enabled: bool) {
        debug!("submit enabled: {enabled}");
    }

    fn show_progress(&self, percent: f64) {
        let whole = percent.clamp(0.0, 100.0).floor() as u8;
        if self.last_percent.swap(whole, Ordering::Relaxed) != whole {
            info!("upload progress: {whole}%");
        }
    }

    fn state_changed(&self, state: &UploadState) {
        debug!("upload state: {state:?}");
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() {
    if let Err(e) = run().await {
        error!("application error: {e:#}");
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    initialize();

    let cli = Cli::parse();

    let mut config = AppConfig::load().context("failed to load configuration")?;
    if let Some(url) = &cli.url {
        config = config.with_base_url(url)?;
    }

    let client = GatewayClient::new(&config).context("failed to create gateway client")?;
    debug!("using gateway at {}", client.base_url());

    match cli.command {
        Command::Status => watch_status(client).await,
        Command::SetNetwork {
            mode,
            server,
            ssid,
            password,
            ip,
            gateway,
            subnet,
        } => {
            let form = NetworkForm {
                mode,
                server,
                ssid,
                password,
                ip: octet_inputs(&ip),
                gateway: octet_inputs(&gateway),
                subnet: octet_inputs(&subnet),
            };
            ConfigService::submit_network(&client, &form).await?;
            refresh_device_status(&client).await;
            Ok(())
        }
        Command::SetModbus { ip, port } => {
            let form = ModbusForm {
                port,
                ip: octet_inputs(&ip),
            };
            ConfigService::submit_modbus(&client, &form).await?;
            refresh_device_status(&client).await;
            Ok(())
        }
        Command::SetSlaves { slave_list } => {
            ConfigService::submit_slaves(&client, &SlaveListForm { slave_list }).await?;
            refresh_device_status(&client).await;
            Ok(())
        }
        Command::Reboot => Ok(DeviceActionService::reboot(&client).await?),
        Command::FactoryReset => Ok(DeviceActionService::factory_reset(&client).await?),
        Command::Upload { target, file } => upload(&client, target, file).await,
    }
}

fn initialize() {
    log_panics::init();

    let mut builder = if cfg!(debug_assertions) {
        Builder::from_env(Env::default().default_filter_or("debug"))
    } else {
        Builder::from_env(Env::default().default_filter_or("info"))
    };

    builder.format(|f, record| match record.level() {
        log::Level::Error => {
            eprintln!("{}", record.args());
            Ok(())
        }
        _ => {
            writeln!(f, "{}", record.args())
        }
    });

    builder.target(Target::Stdout).init();

    info!("module version: {}", env!("CARGO_PKG_VERSION"));
}

async fn watch_status(client: GatewayClient) -> Result<()> {
    let mut device_view = DeviceStatusView::default();
    let mut modbus_view = ModbusStatusView::default();

    let synchronizer = StatusSynchronizer::start(
        Arc::new(client),
        move |snapshot| {
            if device_view.apply(snapshot) {
                info!("device status\n{device_view}");
            }
        },
        move |snapshot| {
            if modbus_view.apply(snapshot) {
                info!("modbus status\n{modbus_view}");
            }
        },
    );

    tokio::signal::ctrl_c()
        .await
        .context("failed to listen for Ctrl-C")?;

    synchronizer.stop();
    synchronizer.join().await;

    Ok(())
}

async fn refresh_device_status<C: DeviceClient>(client: &C) {
    match client.device_info().await {
        Ok(snapshot) => {
            let mut view = DeviceStatusView::default();
            view.apply(snapshot);
            info!("device status\n{view}");
        }
        Err(e) => warn!("failed to refresh device status: {e}"),
    }
}

async fn upload(client: &GatewayClient, target: UploadTarget, path: Option<PathBuf>) -> Result<()> {
    let file = match path {
        Some(path) => {
            let content = tokio::fs::read(&path)
                .await
                .with_context(|| format!("failed to read {}", path.display()))?;
            let file_name = path
                .file_name()
                .map(|name| name.to_string_lossy().into_owned())
                .with_context(|| format!("failed to get file name of {}", path.display()))?;
            Some(UploadFile::new(file_name, content))
        }
        None => None,
    };

    let controller = UploadController::new(Arc::new(ConsoleUploadView::new()));
    let state = controller.upload(client, target, file).await?;

    if state == UploadState::Completed {
        info!("the device is installing the update and restarts when done");
    }

    Ok(state.into_result()?)
}
