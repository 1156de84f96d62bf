//! In-memory collaborators and a loopback HTTP responder for stage tests.

use std::{
    collections::HashMap,
    sync::{
        atomic::{AtomicUsize, Ordering},
        Arc, Mutex,
    },
    time::Duration,
};

use reqwest::Client;
use tokio::{
    io::{AsyncReadExt, AsyncWriteExt},
    net::TcpListener,
    task::JoinHandle,
};

use crate::{
    configuration::{Config, Stage},
    error::Error,
    model::Raw_Market,
    provider::{BlobStore, Warehouse, HTTP},
};

pub const BITCOIN: &str = r#"[{"id":"bitcoin","symbol":"btc","name":"Bitcoin","current_price":50000,"market_cap":900000000000,"total_volume":30000000000,"high_24h":51000,"low_24h":49000,"last_updated":"2023-01-01T00:00:00Z"}]"#;

#[derive(Debug, Default)]
pub struct MemoryStore {
    pub objects: Mutex<HashMap<String, Vec<u8>>>,
    pub puts: AtomicUsize,
    pub gets: AtomicUsize,
    pub fail_puts: bool,
}

impl MemoryStore {
    pub fn with_object(key: &str, body: &str) -> MemoryStore {
        let store = MemoryStore::default();
        store
            .objects
            .lock()
            .unwrap()
            .insert(key.to_owned(), body.as_bytes().to_vec());
        store
    }

    pub fn object(&self, key: &str) -> Option<Vec<u8>> {
        self.objects.lock().unwrap().get(key).cloned()
    }

    pub fn object_count(&self) -> usize {
        self.objects.lock().unwrap().len()
    }
}

impl BlobStore for MemoryStore {
    fn bucket(&self) -> &str {
        "memory"
    }

    async fn put_json(&self, key: &str, body: Vec<u8>) -> Result<(), Error> {
        self.puts.fetch_add(1, Ordering::SeqCst);
        if self.fail_puts {
            return Err(Error::StorageError(String::from("bucket unavailable")));
        }
        self.objects.lock().unwrap().insert(key.to_owned(), body);
        Ok(())
    }

    async fn get(&self, key: &str) -> Result<Vec<u8>, Error> {
        self.gets.fetch_add(1, Ordering::SeqCst);
        self.object(key)
            .ok_or_else(|| Error::MissingPartition(key.to_owned()))
    }
}

/// Holds the "table" in memory. A failing replace leaves the previous rows
/// in place, the way a rolled back transaction does.
#[derive(Debug, Default)]
pub struct MemoryWarehouse {
    pub rows: Mutex<Vec<Raw_Market>>,
    pub replaces: AtomicUsize,
    pub fail: bool,
}

impl MemoryWarehouse {
    pub fn with_rows(rows: Vec<Raw_Market>) -> MemoryWarehouse {
        MemoryWarehouse {
            rows: Mutex::new(rows),
            ..MemoryWarehouse::default()
        }
    }

    pub fn rows(&self) -> Vec<Raw_Market> {
        self.rows.lock().unwrap().clone()
    }
}

impl Warehouse for MemoryWarehouse {
    async fn replace_markets(&self, rows: &[Raw_Market]) -> Result<u64, Error> {
        self.replaces.fetch_add(1, Ordering::SeqCst);
        if self.fail {
            return Err(Error::SQL(sqlx::Error::PoolTimedOut));
        }
        *self.rows.lock().unwrap() = rows.to_vec();
        Ok(rows.len() as u64)
    }
}

#[derive(Debug, Clone)]
pub enum Reply {
    Status(u16, String),
    Stall(Duration),
}

/// Minimal HTTP/1.1 responder on 127.0.0.1 answering one connection per
/// reply, in order. Request lines are recorded for assertions.
pub struct ApiStub {
    pub base_url: String,
    pub requests: Arc<Mutex<Vec<String>>>,
    pub handle: JoinHandle<()>,
}

impl ApiStub {
    pub async fn start(replies: Vec<Reply>) -> ApiStub {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let address = listener.local_addr().unwrap();
        let requests = Arc::new(Mutex::new(Vec::new()));
        let recorded = requests.clone();

        let handle = tokio::spawn(async move {
            for reply in replies {
                let (mut socket, _) = listener.accept().await.unwrap();
                let mut buffer = Vec::new();
                let mut chunk = [0u8; 1024];

                while !buffer.windows(4).any(|w| w == b"\r\n\r\n") {
                    let read = socket.read(&mut chunk).await.unwrap();
                    if read == 0 {
                        break;
                    }
                    buffer.extend_from_slice(&chunk[..read]);
                }

                let request = String::from_utf8_lossy(&buffer);
                if let Some(line) = request.lines().next() {
                    recorded.lock().unwrap().push(line.to_owned());
                }

                match reply {
                    Reply::Status(status, body) => {
                        let response = format!(
                            "HTTP/1.1 {} Stub\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                            status,
                            body.len(),
                            body
                        );
                        socket.write_all(response.as_bytes()).await.unwrap();
                        socket.shutdown().await.ok();
                    },
                    Reply::Stall(duration) => {
                        tokio::time::sleep(duration).await;
                    },
                }
            }
        });

        ApiStub {
            base_url: format!("http://{}/api/v3", address),
            requests,
            handle,
        }
    }

    pub fn requests(&self) -> Vec<String> {
        self.requests.lock().unwrap().clone()
    }
}

pub fn config(api_url: &str, api_timeout: u64) -> Config {
    let api_timeout = api_timeout.to_string();
    let vars = HashMap::from([
        ("S3_BUCKET_NAME", String::from("lakehouse")),
        ("COINGECKO_API_URL", api_url.to_owned()),
        ("API_TIMEOUT", api_timeout),
        ("STAGE_RETRY_DELAY", String::from("0")),
    ]);

    Config::from_lookup(Stage::Extract, |key| vars.get(key).cloned()).unwrap()
}

/// Client for an `ApiStub`, bypassing any proxy configured in the environment.
pub fn http(config: &Config) -> HTTP {
    let client = Client::builder()
        .timeout(Duration::from_secs(config.api_timeout))
        .no_proxy()
        .build()
        .unwrap();

    HTTP::from_client(config, client).unwrap()
}
