//! Local HTTP server proxying the feed and serving the tracker page.

use std::sync::Arc;
use std::thread::{self, JoinHandle};

use serde_json::json;
use starwatch_config::FeedConfig;
use tiny_http::{Header, Method, Request, Response, Server};
use tracing::{error, info, warn};

use crate::client::NeoFeedClient;
use crate::error::{FeedError, FeedServerError};
use crate::page::PageState;

/// Generic message for failures that are not an upstream status.
pub const FETCH_FAILED_MESSAGE: &str = "Failed to fetch asteroid data";

/// HTTP server for the feed proxy and page.
/// Runs on a background thread and shares nothing with the render loop.
pub struct FeedServer {
    address: String,
    port: u16,
    actual_port: Option<u16>,
    server: Option<Arc<Server>>,
    handle: Option<JoinHandle<()>>,
}

impl FeedServer {
    pub fn new(address: impl Into<String>, port: u16) -> Self {
        Self {
            address: address.into(),
            port,
            actual_port: None,
            server: None,
            handle: None,
        }
    }

    pub fn from_config(config: &FeedConfig) -> Self {
        Self::new(config.listen_address.clone(), config.port)
    }

    pub fn start(&mut self, client: NeoFeedClient) -> Result<(), FeedServerError> {
        let server = Server::http(format!("{}:{}", self.address, self.port)).map_err(|e| {
            FeedServerError::BindError {
                address: self.address.clone(),
                port: self.port,
                error: e.to_string(),
            }
        })?;

        let actual_port = server
            .server_addr()
            .to_ip()
            .map(|addr| addr.port())
            .unwrap_or(self.port);
        self.actual_port = Some(actual_port);
        info!("Feed server listening on http://{}:{}", self.address, actual_port);

        let server = Arc::new(server);
        let worker = server.clone();
        let handle = thread::Builder::new()
            .name("feed-server".to_string())
            .spawn(move || Self::run_server(&worker, &client))
            .map_err(|e| FeedServerError::BindError {
                address: self.address.clone(),
                port: actual_port,
                error: e.to_string(),
            })?;

        self.server = Some(server);
        self.handle = Some(handle);
        Ok(())
    }

    /// Unblock the accept loop and wait for the server thread.
    pub fn stop(&mut self) -> Result<(), FeedServerError> {
        if let Some(server) = self.server.take() {
            server.unblock();
        }
        if let Some(handle) = self.handle.take() {
            handle.join().map_err(|_| FeedServerError::ThreadPanic)?;
            info!("Feed server stopped");
        }
        Ok(())
    }

    /// Block until the server thread exits.
    pub fn wait(&mut self) -> Result<(), FeedServerError> {
        if let Some(handle) = self.handle.take() {
            handle.join().map_err(|_| FeedServerError::ThreadPanic)?;
        }
        self.server = None;
        Ok(())
    }

    pub fn actual_port(&self) -> u16 {
        self.actual_port.unwrap_or(self.port)
    }

    pub fn is_running(&self) -> bool {
        self.handle.is_some()
    }

    fn run_server(server: &Server, client: &NeoFeedClient) {
        for request in server.incoming_requests() {
            if let Err(e) = Self::handle_request(request, client) {
                warn!("Feed server failed to respond: {e}");
            }
        }
    }

    fn handle_request(request: Request, client: &NeoFeedClient) -> std::io::Result<()> {
        let path = request
            .url()
            .split('?')
            .next()
            .unwrap_or_default()
            .to_string();
        let method = request.method().clone();
        if path.starts_with("/api/") {
            info!("API Request: {} {}", method, path);
        }

        match (&method, path.as_str()) {
            (&Method::Get, "/api/neo-data") => {
                let (status, body) = neo_data_response(client.fetch_today());
                respond(request, status, "application/json", body.to_string())
            }
            (&Method::Get, "/") => {
                let page = PageState::from_result(client.fetch_today());
                if let PageState::Error(cause) = &page {
                    warn!("Tracker page showing error: {cause}");
                }
                respond(request, 200, "text/html; charset=utf-8", page.render_html())
            }
            _ => respond(
                request,
                404,
                "application/json",
                json!({ "error": "Not found" }).to_string(),
            ),
        }
    }
}

impl Drop for FeedServer {
    fn drop(&mut self) {
        if let Err(e) = self.stop() {
            error!("Feed server shutdown failed: {e}");
        }
    }
}

/// Status and JSON body for `GET /api/neo-data`.
pub fn neo_data_response(
    result: Result<Vec<crate::client::NearEarthObject>, FeedError>,
) -> (u16, serde_json::Value) {
    match result {
        Ok(objects) => (200, json!({ "nearEarthObjects": objects })),
        Err(e @ FeedError::Upstream { .. }) => {
            let status = e.upstream_status().unwrap_or(500);
            (status, json!({ "error": e.to_string() }))
        }
        Err(e) => {
            error!("Error fetching NASA data: {e}");
            (500, json!({ "error": FETCH_FAILED_MESSAGE }))
        }
    }
}

fn respond(request: Request, status: u16, content_type: &str, body: String) -> std::io::Result<()> {
    let mut response = Response::from_string(body).with_status_code(status);
    if let Ok(header) = Header::from_bytes(&b"Content-Type"[..], content_type.as_bytes()) {
        response.add_header(header);
    }
    request.respond(response)
}
