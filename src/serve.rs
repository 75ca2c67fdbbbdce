//! HTTP server for interactive analysis mode
//!
//! `fakeshot serve` → starts server, opens browser, upload an image, see the verdict
//!
//! Uploaded bytes live only for the duration of the request.

use crate::analyzer::{AnalysisResult, Analyzer, ImageFile, ScanRecord};
use crate::report::Summary;
use crate::scan;
use crate::verdict::Verdict;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::io::Read;
use std::path::PathBuf;
use tiny_http::{Header, Method, Request, Response, Server};
use tracing::{info, warn};

// Embed the UI directly in the binary
const UI_HTML: &str = include_str!("ui.html");

#[derive(Serialize)]
struct ApiResponse<T> {
    ok: bool,
    data: Option<T>,
    error: Option<String>,
}

impl<T: Serialize> ApiResponse<T> {
    fn success(data: T) -> Self {
        Self { ok: true, data: Some(data), error: None }
    }

    fn failure(data: Option<T>, error: String) -> Self {
        Self { ok: false, data, error: Some(error) }
    }
}

/// Body of a single-image scan response
#[derive(Serialize)]
pub struct ScanResponse {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<AnalysisResult>,
    pub verdict: Verdict,
}

#[derive(Deserialize, Serialize, Debug)]
pub struct AnalyzeParams {
    pub path: String,
}

#[derive(Serialize)]
pub struct AnalysisReport {
    pub generated: String,
    pub summary: Summary,
    pub files: Vec<ScanRecord>,
    pub params: AnalyzeParams,
}

/// Server settings
#[derive(Debug, Clone)]
pub struct ServeOptions {
    pub port: u16,
    /// Directory offered for batch scans from the UI
    pub path: PathBuf,
    /// Largest accepted upload in bytes
    pub max_upload: usize,
    pub open_browser: bool,
}

/// Start server, open browser, serve UI
pub fn start(options: ServeOptions, analyzer: Analyzer) -> std::io::Result<()> {
    let addr = format!("127.0.0.1:{}", options.port);
    let server = Server::http(&addr).map_err(|e| std::io::Error::new(std::io::ErrorKind::Other, e.to_string()))?;

    let url = format!("http://localhost:{}", options.port);
    let path_str = options
        .path
        .canonicalize()
        .unwrap_or_else(|_| options.path.clone())
        .display()
        .to_string();

    eprintln!("\n\x1b[1;32mfakeshot\x1b[0m");
    eprintln!("   {}", url);
    eprintln!("   Scan folder: {}\n", path_str);
    info!(%addr, "server listening");

    if options.open_browser {
        let _ = open::that(&url);
    }

    for request in server.incoming_requests() {
        if let Err(e) = handle_request(request, &path_str, options.max_upload, &analyzer) {
            warn!(error = %e, "request failed");
        }
    }

    Ok(())
}

fn json_header() -> Header {
    Header::from_bytes(&b"Content-Type"[..], &b"application/json"[..]).expect("static header is valid")
}

fn html_header() -> Header {
    Header::from_bytes(&b"Content-Type"[..], &b"text/html; charset=utf-8"[..]).expect("static header is valid")
}

fn respond_json<T: Serialize>(request: Request, status: u16, body: &T) -> std::io::Result<()> {
    let json = serde_json::to_string(body)?;
    let response = Response::from_string(json)
        .with_status_code(status)
        .with_header(json_header());
    request.respond(response)
}

fn handle_request(
    mut request: Request,
    default_path: &str,
    max_upload: usize,
    analyzer: &Analyzer,
) -> std::io::Result<()> {
    let url = request.url().to_string();
    let path = url.split('?').next().unwrap_or("/");
    let method = request.method().clone();

    match (&method, path) {
        // Serve embedded UI
        (&Method::Get, "/") => {
            let html = UI_HTML.replace("{{DEFAULT_PATH}}", &html_escape(default_path));
            let response = Response::from_string(html).with_header(html_header());
            request.respond(response)
        }

        // API: score one uploaded image
        (&Method::Post, "/api/scan") => {
            let media_type = declared_media_type(&request);

            let declared = request.body_length();
            let bytes = match read_upload(request.as_reader(), declared, max_upload)? {
                Some(bytes) => bytes,
                None => {
                    let body = ApiResponse::failure(
                        Some(ScanResponse { result: None, verdict: Verdict::degraded() }),
                        format!("upload exceeds {} bytes", max_upload),
                    );
                    return respond_json(request, 413, &body);
                }
            };

            let image = ImageFile::new(bytes, media_type);
            let outcome = analyzer.analyze(&image);
            let verdict = Verdict::from_outcome(&outcome);

            match outcome {
                Ok(result) => respond_json(
                    request,
                    200,
                    &ApiResponse::success(ScanResponse { result: Some(result), verdict }),
                ),
                Err(e) => {
                    warn!(error = %e, "scan failed");
                    respond_json(
                        request,
                        422,
                        &ApiResponse::failure(Some(ScanResponse { result: None, verdict }), e.to_string()),
                    )
                }
            }
        }

        // API: batch scan of a local path
        (&Method::Get, "/api/analyze") | (&Method::Post, "/api/analyze") => {
            let params = parse_params(&mut request, default_path)?;
            info!(path = %params.path, "batch scan");

            let report = run_analysis(params, analyzer);
            respond_json(request, 200, &ApiResponse::success(report))
        }

        // 404
        _ => {
            let response = Response::from_string("Not found").with_status_code(404);
            request.respond(response)
        }
    }
}

/// Read an upload body, or `None` if it is larger than `max_upload`.
///
/// A declared length over the limit is rejected before reading; otherwise at
/// most one byte past the limit is read.
fn read_upload<R: Read>(reader: R, declared: Option<usize>, max_upload: usize) -> std::io::Result<Option<Vec<u8>>> {
    if declared.map_or(false, |len| len > max_upload) {
        return Ok(None);
    }

    let mut bytes = Vec::new();
    reader.take(max_upload as u64 + 1).read_to_end(&mut bytes)?;
    if bytes.len() > max_upload {
        return Ok(None);
    }
    Ok(Some(bytes))
}

fn declared_media_type(request: &Request) -> String {
    request
        .headers()
        .iter()
        .find(|h| h.field.equiv("Content-Type"))
        .map(|h| h.value.as_str().split(';').next().unwrap_or("").trim().to_string())
        .filter(|v| !v.is_empty())
        .unwrap_or_else(|| "application/octet-stream".to_string())
}

fn parse_params(request: &mut Request, default_path: &str) -> std::io::Result<AnalyzeParams> {
    let url = request.url().to_string();

    // Try query string
    if let Some(query) = url.split('?').nth(1) {
        if let Ok(params) = serde_urlencoded::from_str::<AnalyzeParams>(query) {
            return Ok(params);
        }
    }

    // Try JSON body
    let mut body = String::new();
    request.as_reader().read_to_string(&mut body)?;
    if !body.is_empty() {
        if let Ok(params) = serde_json::from_str::<AnalyzeParams>(&body) {
            return Ok(params);
        }
    }

    // Fall back to default path
    Ok(AnalyzeParams { path: default_path.to_string() })
}

fn run_analysis(params: AnalyzeParams, analyzer: &Analyzer) -> AnalysisReport {
    let files = scan::collect_images(&PathBuf::from(&params.path));
    let records: Vec<ScanRecord> = files.par_iter().map(|p| analyzer.analyze_path(p)).collect();
    let summary = Summary::from_records(&records);

    AnalysisReport {
        generated: chrono::Local::now().to_rfc3339(),
        summary,
        files: records,
        params,
    }
}

fn html_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}
