//! HTTP bandwidth test against speedtest.net-compatible servers
//!
//! A server exposes `/speedtest/latency.txt`, a handful of
//! `/speedtest/randomNxN.jpg` images and `/speedtest/upload.php`. Latency,
//! download and upload are measured with plain sequential requests.

use crate::{
    error::{AppError, Result},
    logging::Logger,
    models::Config,
};
use rand::{distr::Alphanumeric, Rng};
use regex::Regex;
use reqwest::Client;
use std::sync::LazyLock;
use std::time::Instant;

/// Images fetched for the download measurement
pub const DOWNLOAD_FILES: &[&str] = &[
    "/speedtest/random350x350.jpg",
    "/speedtest/random500x500.jpg",
    "/speedtest/random1500x1500.jpg",
];

/// Payload sizes (characters) posted for the upload measurement
pub const UPLOAD_SIZES: &[usize] = &[132_884, 493_638];

static CLIENT_LOCATION: LazyLock<std::result::Result<Regex, regex::Error>> =
    LazyLock::new(|| Regex::new(r#"<client ip="[^"]*" lat="([^"]*)" lon="([^"]*)""#));
static SERVER_ENTRY: LazyLock<std::result::Result<Regex, regex::Error>> =
    LazyLock::new(|| Regex::new(r#"<server url="([^"]*)"[^>]*?\slat="([^"]*)" lon="([^"]*)""#));
static UPLOAD_HOST: LazyLock<std::result::Result<Regex, regex::Error>> =
    LazyLock::new(|| Regex::new(r"https?://([^/]+)/speedtest/upload\.php"));

const LATENCY_SAMPLES: usize = 5;
const CANDIDATE_SERVERS: usize = 5;

/// Render a bits-per-second value with a binary unit prefix
pub fn pretty_speed(speed: f64) -> String {
    const UNITS: [&str; 4] = ["bps", "Kbps", "Mbps", "Gbps"];
    let mut speed = speed;
    let mut unit = 0;
    while speed >= 1024.0 && unit < UNITS.len() - 1 {
        speed /= 1024.0;
        unit += 1;
    }
    format!("{:.2} {}", speed, UNITS[unit])
}

/// Round to two decimal places
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// One candidate from the server directory
#[derive(Debug, Clone, PartialEq)]
pub struct ServerEntry {
    pub host: String,
    pub lat: f64,
    pub lon: f64,
}

pub struct SpeedTest {
    client: Client,
    host: Option<String>,
    runs: u32,
    directory_url: String,
    logger: Logger,
}

impl SpeedTest {
    /// `host` is `name[:port]`; when absent the closest server is chosen
    pub fn new(host: Option<String>, runs: u32, config: &Config, logger: &Logger) -> Result<Self> {
        if runs == 0 {
            return Err(AppError::validation("Speedtest runs must be at least 1"));
        }

        let client = Client::builder()
            .timeout(config.http_timeout())
            .user_agent(format!("{}/{}", crate::PKG_NAME, crate::VERSION))
            .build()
            .map_err(|e| AppError::config(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            host: host.map(|h| h.trim().to_string()).filter(|h| !h.is_empty()),
            runs,
            directory_url: config.speedtest_directory_url.trim_end_matches('/').to_string(),
            logger: logger.named("SPEEDTEST"),
        })
    }

    /// The configured server, or the best one from the directory
    pub async fn resolve_host(&self) -> Result<String> {
        match &self.host {
            Some(host) => Ok(host.clone()),
            None => self.choose_server().await,
        }
    }

    /// Average latency in milliseconds; the slowest sample is discarded
    pub async fn ping(&self, server: &str) -> Result<f64> {
        let mut samples = Vec::with_capacity(LATENCY_SAMPLES);

        for _ in 0..LATENCY_SAMPLES {
            let url = format!("http://{}/speedtest/latency.txt?x={}", server, cache_buster());
            let started = Instant::now();
            let response = self.client.get(&url).send().await?.error_for_status()?;
            response.bytes().await?;
            samples.push(started.elapsed().as_secs_f64() * 1000.0);
        }

        if let Some(worst) = samples
            .iter()
            .enumerate()
            .max_by(|a, b| a.1.total_cmp(b.1))
            .map(|(i, _)| i)
        {
            samples.remove(worst);
        }

        Ok(samples.iter().sum::<f64>() / samples.len() as f64)
    }

    /// Download throughput in bits per second
    pub async fn download(&self, server: &str) -> Result<f64> {
        let mut total_bytes: u64 = 0;
        let started = Instant::now();

        for file in DOWNLOAD_FILES {
            for run in 1..=self.runs {
                let url = format!("http://{}{}?x={}", server, file, cache_buster());
                let body = self.client.get(&url).send().await?.error_for_status()?.bytes().await?;
                total_bytes += body.len() as u64;

                self.logger.debug("Download run finished")
                    .field("file", file)
                    .field("run", run)
                    .field("bytes", body.len())
                    .log()
                    .await;
            }
        }

        let total_ms = elapsed_ms(started);
        self.logger.info(&format!("Took {:.0} ms to download {} bytes", total_ms, total_bytes)).log().await;

        Ok(total_bytes as f64 * 8000.0 / total_ms)
    }

    /// Upload throughput in bits per second
    pub async fn upload(&self, server: &str) -> Result<f64> {
        let payloads: Vec<String> = UPLOAD_SIZES
            .iter()
            .map(|&size| format!("content0={}", random_payload(size)))
            .collect();

        let mut total_bytes: u64 = 0;
        let started = Instant::now();

        for payload in &payloads {
            for run in 1..=self.runs {
                let url = format!("http://{}/speedtest/upload.php?x={}", server, cache_buster());
                let reply = self
                    .client
                    .post(&url)
                    .header(reqwest::header::CONTENT_TYPE, "application/x-www-form-urlencoded")
                    .body(payload.clone())
                    .send()
                    .await?
                    .error_for_status()?
                    .text()
                    .await?;

                let uploaded = parse_upload_reply(&reply).unwrap_or(payload.len() as u64);
                total_bytes += uploaded;

                self.logger.debug("Upload run finished")
                    .field("run", run)
                    .field("bytes", uploaded)
                    .log()
                    .await;
            }
        }

        let total_ms = elapsed_ms(started);
        self.logger.info(&format!("Took {:.0} ms to upload {} bytes", total_ms, total_bytes)).log().await;

        Ok(total_bytes as f64 * 8000.0 / total_ms)
    }

    /// Pick the lowest-latency server among the closest candidates
    pub async fn choose_server(&self) -> Result<String> {
        let now = chrono::Utc::now().timestamp_millis();

        let config_url = format!("{}/speedtest-config.php?x={}", self.directory_url, now);
        let config_reply = self.client.get(&config_url).send().await?.error_for_status()?.text().await?;
        let (lat, lon) = parse_client_location(&config_reply)?;

        let servers_url = format!("{}/speedtest-servers.php?x={}", self.directory_url, now);
        let servers_reply = self.client.get(&servers_url).send().await?.error_for_status()?.text().await?;
        let mut servers = parse_server_list(&servers_reply)?;

        if servers.is_empty() {
            return Err(AppError::parse("Speedtest server list is empty"));
        }

        servers.sort_by(|a, b| distance(a, lat, lon).total_cmp(&distance(b, lat, lon)));

        let mut best: Option<(String, f64)> = None;
        for server in servers.iter().take(CANDIDATE_SERVERS) {
            match self.ping(&server.host).await {
                Ok(latency) => {
                    self.logger.debug("Candidate server latency")
                        .field("server", &server.host)
                        .field("latency_ms", latency)
                        .log()
                        .await;
                    if best.as_ref().map_or(true, |(_, b)| latency < *b) {
                        best = Some((server.host.clone(), latency));
                    }
                }
                Err(e) => {
                    self.logger.warn("Candidate server did not answer")
                        .field("server", &server.host)
                        .error_info(&e)
                        .log()
                        .await;
                }
            }
        }

        best.map(|(host, _)| host)
            .ok_or_else(|| AppError::network("None of the closest speedtest servers answered"))
    }
}

fn cache_buster() -> u32 {
    rand::rng().random()
}

fn random_payload(size: usize) -> String {
    rand::rng()
        .sample_iter(&Alphanumeric)
        .take(size)
        .map(char::from)
        .collect()
}

fn elapsed_ms(started: Instant) -> f64 {
    (started.elapsed().as_secs_f64() * 1000.0).max(f64::EPSILON)
}

fn distance(server: &ServerEntry, lat: f64, lon: f64) -> f64 {
    ((server.lat - lat).powi(2) + (server.lon - lon).powi(2)).sqrt()
}

/// Parse `size=N` replies from `upload.php`
fn parse_upload_reply(reply: &str) -> Option<u64> {
    reply.trim().split_once('=').and_then(|(_, n)| n.trim().parse().ok())
}

fn compiled(pattern: &'static LazyLock<std::result::Result<Regex, regex::Error>>) -> Result<&'static Regex> {
    pattern.as_ref().map_err(|e| AppError::from(e.clone()))
}

fn parse_client_location(reply: &str) -> Result<(f64, f64)> {
    let caps = compiled(&CLIENT_LOCATION)?
        .captures(reply)
        .ok_or_else(|| AppError::parse("Speedtest configuration does not contain the client location"))?;
    Ok((caps[1].parse()?, caps[2].parse()?))
}

/// Extract candidate servers from the directory XML
pub fn parse_server_list(reply: &str) -> Result<Vec<ServerEntry>> {
    let server = compiled(&SERVER_ENTRY)?;
    let host = compiled(&UPLOAD_HOST)?;

    let mut entries = Vec::new();
    for caps in server.captures_iter(reply) {
        let Some(host_caps) = host.captures(&caps[1]) else { continue };
        let (Ok(lat), Ok(lon)) = (caps[2].parse::<f64>(), caps[3].parse::<f64>()) else { continue };
        entries.push(ServerEntry {
            host: host_caps[1].to_string(),
            lat,
            lon,
        });
    }
    Ok(entries)
}
