use gateway_ui::{
    config::AppConfig,
    device_client::{DeviceClient, GatewayClient},
    error::ClientError,
    types::{
        ModbusConfig, NetworkConfig, ProgressFn, ServerMode, SlaveSet, UPLOAD_SUCCESS_SENTINEL,
        UploadEndpoint, UploadFile, UploadTarget, WifiMode,
    },
};
use serde_json::{Value, json};
use std::{
    collections::HashMap,
    sync::{Arc, Mutex},
};
use tokio::io::{AsyncBufReadExt, AsyncReadExt, AsyncWriteExt, BufReader};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::mpsc;

#[derive(Debug)]
struct RecordedRequest {
    method: String,
    path: String,
    headers: HashMap<String, String>,
    body: Vec<u8>,
}

impl RecordedRequest {
    fn json(&self) -> Value {
        serde_json::from_slice(&self.body).expect("request body should be JSON")
    }
}

/// Canned answer of the mock gateway for one path
struct Route {
    path: &'static str,
    status: u16,
    body: &'static str,
}

fn route(path: &'static str, status: u16, body: &'static str) -> Route {
    Route { path, status, body }
}

async fn read_body(
    reader: &mut BufReader<&mut TcpStream>,
    headers: &HashMap<String, String>,
) -> std::io::Result<Vec<u8>> {
    if let Some(len) = headers.get("content-length") {
        let mut body = vec![0; len.parse().unwrap_or(0)];
        reader.read_exact(&mut body).await?;
        return Ok(body);
    }

    let mut body = Vec::new();
    if headers.get("transfer-encoding").map(String::as_str) == Some("chunked") {
        loop {
            let mut size_line = String::new();
            reader.read_line(&mut size_line).await?;
            let size = usize::from_str_radix(size_line.trim(), 16).unwrap_or(0);

            let mut chunk = vec![0; size + 2];
            reader.read_exact(&mut chunk).await?;
            if size == 0 {
                break;
            }
            body.extend_from_slice(&chunk[..size]);
        }
    }
    Ok(body)
}

async fn handle_connection(
    mut stream: TcpStream,
    routes: Arc<Vec<Route>>,
    recorded: mpsc::UnboundedSender<RecordedRequest>,
) -> std::io::Result<()> {
    let (method, path, headers, body) = {
        let mut reader = BufReader::new(&mut stream);

        let mut request_line = String::new();
        reader.read_line(&mut request_line).await?;
        let mut parts = request_line.split_whitespace();
        let method = parts.next().unwrap_or_default().to_string();
        let path = parts.next().unwrap_or_default().to_string();

        let mut headers = HashMap::new();
        loop {
            let mut line = String::new();
            reader.read_line(&mut line).await?;
            if line.trim().is_empty() {
                break;
            }
            if let Some((name, value)) = line.split_once(':') {
                headers.insert(name.trim().to_ascii_lowercase(), value.trim().to_string());
            }
        }

        let body = read_body(&mut reader, &headers).await?;
        (method, path, headers, body)
    };

    let (status, response_body) = routes
        .iter()
        .find(|route| route.path == path)
        .map(|route| (route.status, route.body))
        .unwrap_or((404, "not found"));

    let _ = recorded.send(RecordedRequest {
        method,
        path,
        headers,
        body,
    });

    let response = format!(
        "HTTP/1.1 {status} Mock\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{response_body}",
        response_body.len()
    );
    stream.write_all(response.as_bytes()).await?;
    stream.shutdown().await
}

/// Start a mock gateway answering `routes`, returning its base URL and the
/// requests it received
async fn start_mock_gateway(
    routes: Vec<Route>,
) -> (String, mpsc::UnboundedReceiver<RecordedRequest>) {
    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .expect("failed to bind mock gateway");
    let addr = listener.local_addr().expect("failed to get local address");
    let routes = Arc::new(routes);
    let (tx, rx) = mpsc::unbounded_channel();

    tokio::spawn(async move {
        while let Ok((stream, _)) = listener.accept().await {
            tokio::spawn(handle_connection(stream, routes.clone(), tx.clone()));
        }
    });

    (format!("http://{addr}"), rx)
}

fn client_for(base_url: &str, vars: &[(&str, &str)]) -> GatewayClient {
    let mut vars: HashMap<String, String> = vars
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
    vars.insert("GATEWAY_URL".to_string(), base_url.to_string());

    let config = AppConfig::from_lookup(|key| vars.get(key).cloned())
        .expect("failed to load test configuration");
    GatewayClient::new(&config).expect("failed to create gateway client")
}

mod status_endpoints {
    use super::*;

    #[tokio::test]
    async fn device_info_accepts_partial_and_numeric_fields() {
        let (base_url, mut requests) = start_mock_gateway(vec![route(
            "/api/get-device-info",
            200,
            r#"{"firmware_version":"1.4.2","mode":2,"ssid":null}"#,
        )])
        .await;
        let client = client_for(&base_url, &[]);

        let snapshot = client.device_info().await.unwrap();

        assert_eq!(snapshot.firmware_version.as_deref(), Some("1.4.2"));
        assert_eq!(snapshot.mode.as_deref(), Some("2"));
        assert_eq!(snapshot.ssid, None);
        assert_eq!(snapshot.device_ip, None);

        let request = requests.recv().await.unwrap();
        assert_eq!(request.method, "GET");
        assert_eq!(request.path, "/api/get-device-info");
    }

    #[tokio::test]
    async fn modbus_info_decodes_slave_list() {
        let (base_url, _requests) = start_mock_gateway(vec![route(
            "/api/get-modbus-info",
            200,
            r#"{"modbus_ip":"10.0.0.5","port":502,"slave_list":[1,2,3]}"#,
        )])
        .await;
        let client = client_for(&base_url, &[]);

        let snapshot = client.modbus_info().await.unwrap();

        assert_eq!(snapshot.modbus_ip.as_deref(), Some("10.0.0.5"));
        assert_eq!(snapshot.port.as_deref(), Some("502"));
        assert_eq!(snapshot.slave_list, Some(vec![1, 2, 3]));
    }

    #[tokio::test]
    async fn server_error_is_protocol_error() {
        let (base_url, _requests) =
            start_mock_gateway(vec![route("/api/get-device-info", 500, "busy")]).await;
        let client = client_for(&base_url, &[]);

        let err = client.device_info().await.unwrap_err();

        assert!(
            matches!(err, ClientError::Protocol { status: 500, ref body } if body == "busy"),
            "{err:?}"
        );
    }

    #[tokio::test]
    async fn malformed_body_is_decode_error() {
        let (base_url, _requests) =
            start_mock_gateway(vec![route("/api/get-modbus-info", 200, "{not json")]).await;
        let client = client_for(&base_url, &[]);

        let err = client.modbus_info().await.unwrap_err();

        assert!(matches!(err, ClientError::Decode(_)), "{err:?}");
    }

    #[tokio::test]
    async fn unreachable_device_is_transport_error() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);
        let client = client_for(&format!("http://{addr}"), &[]);

        let err = client.device_info().await.unwrap_err();

        assert!(matches!(err, ClientError::Transport(_)), "{err:?}");
    }
}

mod configuration_endpoints {
    use super::*;

    #[tokio::test]
    async fn set_network_posts_json_body() {
        let (base_url, mut requests) =
            start_mock_gateway(vec![route("/api/set-network", 200, "{}")]).await;
        let client = client_for(&base_url, &[]);

        client
            .set_network(NetworkConfig {
                mode: WifiMode::Station,
                server: ServerMode::Static,
                ssid: "plant-floor".to_string(),
                password: "correct-horse".to_string(),
                ip: "192.168.2.20".to_string(),
                gateway: "192.168.2.1".to_string(),
                subnet: "255.255.255.0".to_string(),
            })
            .await
            .unwrap();

        let request = requests.recv().await.unwrap();
        assert_eq!(request.method, "POST");
        assert_eq!(request.path, "/api/set-network");
        assert_eq!(
            request.headers.get("content-type").map(String::as_str),
            Some("application/json")
        );
        assert_eq!(
            request.json(),
            json!({
                "mode": 2,
                "server": 1,
                "ssid": "plant-floor",
                "password": "correct-horse",
                "ip": "192.168.2.20",
                "gateway": "192.168.2.1",
                "subnet": "255.255.255.0",
            })
        );
    }

    #[tokio::test]
    async fn set_modbus_and_slaves_post_their_payloads() {
        let (base_url, mut requests) = start_mock_gateway(vec![
            route("/api/set-modbus", 200, "{}"),
            route("/api/set-slave", 200, "{}"),
        ])
        .await;
        let client = client_for(&base_url, &[]);

        client
            .set_modbus(ModbusConfig {
                port: 502,
                ip: "10.0.0.5".to_string(),
            })
            .await
            .unwrap();
        client.set_slave(SlaveSet::new(vec![3, 1, 2])).await.unwrap();

        let modbus = requests.recv().await.unwrap();
        assert_eq!(modbus.json(), json!({ "port": 502, "ip": "10.0.0.5" }));

        let slaves = requests.recv().await.unwrap();
        assert_eq!(slaves.path, "/api/set-slave");
        assert_eq!(
            slaves.json(),
            json!({ "slave_set": 1, "slave_list": [3, 1, 2] })
        );
    }

    #[tokio::test]
    async fn rejected_submission_is_protocol_error() {
        let (base_url, _requests) =
            start_mock_gateway(vec![route("/api/set-modbus", 400, "bad port")]).await;
        let client = client_for(&base_url, &[]);

        let err = client
            .set_modbus(ModbusConfig {
                port: 502,
                ip: "10.0.0.5".to_string(),
            })
            .await
            .unwrap_err();

        assert!(matches!(err, ClientError::Protocol { status: 400, .. }));
    }
}

mod device_actions {
    use super::*;

    #[tokio::test]
    async fn restart_posts_restart_flag() {
        let (base_url, mut requests) =
            start_mock_gateway(vec![route("/api/restart", 200, "{}")]).await;
        let client = client_for(&base_url, &[]);

        client.restart().await.unwrap();

        let request = requests.recv().await.unwrap();
        assert_eq!(request.path, "/api/restart");
        assert_eq!(request.json(), json!({ "restart": 1 }));
    }

    #[tokio::test]
    async fn factory_reset_uses_configured_key() {
        let (base_url, mut requests) =
            start_mock_gateway(vec![route("/api/freset", 200, "{}")]).await;

        client_for(&base_url, &[]).factory_reset().await.unwrap();
        client_for(&base_url, &[("FACTORY_RESET_KEY", "factory_reset")])
            .factory_reset()
            .await
            .unwrap();

        assert_eq!(
            requests.recv().await.unwrap().json(),
            json!({ "freset": 1 })
        );
        assert_eq!(
            requests.recv().await.unwrap().json(),
            json!({ "factory_reset": 1 })
        );
    }
}

mod upload {
    use super::*;

    #[tokio::test]
    async fn streams_multipart_file_and_reports_progress() {
        let (base_url, mut requests) = start_mock_gateway(vec![route(
            "/api/update-compressed-firmware",
            200,
            UPLOAD_SUCCESS_SENTINEL,
        )])
        .await;
        let client = client_for(&base_url, &[("UPLOAD_CHUNK_SIZE", "4096")]);

        let calls = Arc::new(Mutex::new(Vec::new()));
        let recorded = calls.clone();
        let progress: ProgressFn = Arc::new(move |sent: u64, total: Option<u64>| {
            recorded.lock().unwrap().push((sent, total));
        });

        let endpoint = UploadEndpoint::select(UploadTarget::Firmware, "firmware.bin.zz");
        let response = client
            .upload(
                endpoint,
                UploadFile::new("firmware.bin.zz", vec![0x5A; 10_000]),
                progress,
            )
            .await
            .unwrap();

        assert_eq!(response.status, 200);
        assert_eq!(response.body, UPLOAD_SUCCESS_SENTINEL);

        let calls = calls.lock().unwrap().clone();
        assert_eq!(
            calls,
            vec![
                (4096, Some(10_000)),
                (8192, Some(10_000)),
                (10_000, Some(10_000))
            ]
        );

        let request = requests.recv().await.unwrap();
        assert_eq!(request.path, "/api/update-compressed-firmware");
        assert!(
            request
                .headers
                .get("content-type")
                .is_some_and(|value| value.starts_with("multipart/form-data"))
        );
        let body = String::from_utf8_lossy(&request.body);
        assert!(body.contains(r#"name="fileToUpload""#));
        assert!(body.contains(r#"filename="firmware.bin.zz""#));
        assert!(request.body.len() > 10_000);
    }

    #[tokio::test]
    async fn returns_error_answers_unchecked() {
        let (base_url, _requests) =
            start_mock_gateway(vec![route("/api/update-filesystem", 507, "no space")]).await;
        let client = client_for(&base_url, &[("UPLOAD_FIELD_NAME", "update")]);

        let response = client
            .upload(
                UploadEndpoint::select(UploadTarget::Filesystem, "spiffs.bin"),
                UploadFile::new("spiffs.bin", vec![1, 2, 3]),
                Arc::new(|_: u64, _: Option<u64>| {}),
            )
            .await
            .unwrap();

        assert_eq!(response.status, 507);
        assert_eq!(response.body, "no space");
    }
}
