use axum::{body::Bytes, extract::State};
use serde::{de::DeserializeOwned, Deserialize};

use crate::http::response::{ApiError, ApiResponse};
use crate::http::server::AppState;
use crate::torrc::MutationReport;

type ApiResult = Result<ApiResponse, ApiError>;

/// `{"Port": 9150}`; the lowercase spelling is accepted too.
#[derive(Debug, Default, Deserialize)]
pub struct SetPortRequest {
    #[serde(rename = "Port", alias = "port", default)]
    pub port: i64,
}

/// `{"Codes": "tr,de"}`; the lowercase spelling is accepted too.
#[derive(Debug, Default, Deserialize)]
pub struct SetCountriesRequest {
    #[serde(rename = "Codes", alias = "codes", default)]
    pub codes: String,
}

/// `{"Bridges": ["obfs4 192.0.2.7:443 ... cert=... iat-mode=0"]}`.
#[derive(Debug, Default, Deserialize)]
pub struct SetBridgesRequest {
    #[serde(rename = "Bridges", alias = "bridges", default)]
    pub bridges: Vec<String>,
}

/// An unparsable body is treated like an empty one, so it fails the same
/// validation as a missing field.
fn parse_body<T: DeserializeOwned + Default>(body: &Bytes) -> T {
    match serde_json::from_slice(body) {
        Ok(parsed) => parsed,
        Err(e) => {
            tracing::debug!(error = %e, "ignoring malformed request body");
            T::default()
        }
    }
}

pub async fn status(State(state): State<AppState>) -> ApiResult {
    let document = state.manager.read_document().await?;
    Ok(ApiResponse::data(document.text()))
}

pub async fn read(State(state): State<AppState>) -> ApiResult {
    let document = state.manager.read_document().await?;
    Ok(ApiResponse::data(document.text()))
}

pub async fn set_port(State(state): State<AppState>, body: Bytes) -> ApiResult {
    let request: SetPortRequest = parse_body(&body);
    let report = state.manager.set_socks_port(request.port).await?;
    Ok(ApiResponse::message("port updated").with_data(report_json(&report)))
}

pub async fn set_countries(State(state): State<AppState>, body: Bytes) -> ApiResult {
    let request: SetCountriesRequest = parse_body(&body);
    let report = state.manager.set_exit_countries(&request.codes).await?;
    Ok(ApiResponse::message("countries updated").with_data(report_json(&report)))
}

pub async fn set_bridges(State(state): State<AppState>, body: Bytes) -> ApiResult {
    let request: SetBridgesRequest = parse_body(&body);
    let report = state.manager.set_bridges(&request.bridges).await?;
    Ok(ApiResponse::message("bridges updated").with_data(report_json(&report)))
}

pub async fn disable_bridges(State(state): State<AppState>) -> ApiResult {
    let report = state.manager.disable_bridges().await?;
    Ok(ApiResponse::message("bridges disabled").with_data(report_json(&report)))
}

pub async fn restart(State(state): State<AppState>) -> ApiResult {
    state.manager.restart().await?;
    Ok(ApiResponse::message("tor restarted"))
}

pub async fn reload(State(state): State<AppState>) -> ApiResult {
    state.manager.reload().await?;
    Ok(ApiResponse::message("tor reloaded"))
}

pub async fn get_ip(State(state): State<AppState>) -> ApiResult {
    let ip = state.manager.current_exit_ip().await?;
    Ok(ApiResponse::data(ip))
}

fn report_json(report: &MutationReport) -> serde_json::Value {
    serde_json::to_value(report).unwrap_or(serde_json::Value::Null)
}
