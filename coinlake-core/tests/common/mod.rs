//! Shared fixtures for integration tests: a scripted quote provider, a
//! one-shot loopback HTTP server, and a storage key shape check.

#![allow(dead_code)]

use coinlake_core::domain::Asset;
use coinlake_core::source::{PriceQuoteRaw, QuoteProvider};
use coinlake_core::IngestError;
use regex::Regex;
use std::io::{BufRead, BufReader, Read, Write};
use std::net::TcpListener;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

// ── Scripted provider ───────────────────────────────────────────────

#[derive(Debug, Clone)]
pub enum Outcome {
    Quote(PriceQuoteRaw),
    Network(String),
}

/// Provider that replays a fixed outcome and counts how often it was asked.
#[derive(Debug, Clone)]
pub struct ScriptedProvider {
    outcome: Outcome,
    calls: Arc<AtomicUsize>,
}

impl ScriptedProvider {
    pub fn quoting(raw: PriceQuoteRaw) -> Self {
        Self {
            outcome: Outcome::Quote(raw),
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn failing(reason: &str) -> Self {
        Self {
            outcome: Outcome::Network(reason.to_string()),
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl QuoteProvider for ScriptedProvider {
    fn name(&self) -> &str {
        "scripted"
    }

    fn fetch(&self, _asset: &Asset) -> Result<PriceQuoteRaw, IngestError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match &self.outcome {
            Outcome::Quote(raw) => Ok(raw.clone()),
            Outcome::Network(reason) => Err(IngestError::Network(reason.clone())),
        }
    }
}

// ── One-shot HTTP server ────────────────────────────────────────────

/// What the stub server received.
#[derive(Debug, Clone)]
pub struct CapturedRequest {
    pub request_line: String,
    pub headers: Vec<(String, String)>,
    pub body: Vec<u8>,
}

impl CapturedRequest {
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}

pub struct StubServer {
    pub base_url: String,
    handle: JoinHandle<Option<CapturedRequest>>,
}

impl StubServer {
    /// Accept one connection, wait `delay`, answer with `status` and `body`.
    pub fn respond_once(status: u16, body: &'static str, delay: Duration) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let base_url = format!("http://{}", listener.local_addr().unwrap());

        let handle = thread::spawn(move || {
            let (stream, _) = listener.accept().ok()?;
            let mut reader = BufReader::new(stream);
            let request = read_request(&mut reader)?;

            if !delay.is_zero() {
                thread::sleep(delay);
            }

            let response = format!(
                "HTTP/1.1 {status} {}\r\nContent-Type: application/json\r\nETag: \"stub\"\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
                reason_phrase(status),
                body.len()
            );
            let mut stream = reader.into_inner();
            let _ = stream.write_all(response.as_bytes());
            let _ = stream.flush();
            Some(request)
        });

        Self { base_url, handle }
    }

    /// Wait for the exchange to finish and return the captured request.
    pub fn captured(self) -> CapturedRequest {
        self.handle
            .join()
            .unwrap()
            .expect("stub server received no request")
    }
}

fn read_request<R: BufRead>(reader: &mut R) -> Option<CapturedRequest> {
    let mut request_line = String::new();
    reader.read_line(&mut request_line).ok()?;

    let mut headers = Vec::new();
    loop {
        let mut line = String::new();
        reader.read_line(&mut line).ok()?;
        let line = line.trim_end();
        if line.is_empty() {
            break;
        }
        if let Some((k, v)) = line.split_once(':') {
            headers.push((k.trim().to_string(), v.trim().to_string()));
        }
    }

    let length = headers
        .iter()
        .find(|(k, _)| k.eq_ignore_ascii_case("content-length"))
        .and_then(|(_, v)| v.parse::<usize>().ok())
        .unwrap_or(0);
    let mut body = vec![0u8; length];
    reader.read_exact(&mut body).ok()?;

    Some(CapturedRequest {
        request_line: request_line.trim_end().to_string(),
        headers,
        body,
    })
}

fn reason_phrase(status: u16) -> &'static str {
    match status {
        200 => "OK",
        403 => "Forbidden",
        404 => "Not Found",
        429 => "Too Many Requests",
        500 => "Internal Server Error",
        503 => "Service Unavailable",
        _ => "Unknown",
    }
}

// ── Key shape ───────────────────────────────────────────────────────

/// `raw/\d{4}-\d{2}-\d{2}/btc_price_\d+(\.\d+)?\.json`
pub fn is_partitioned_btc_key(key: &str) -> bool {
    Regex::new(r"^raw/\d{4}-\d{2}-\d{2}/btc_price_\d+(\.\d+)?\.json$")
        .unwrap()
        .is_match(key)
}
