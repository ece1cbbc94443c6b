use async_trait::async_trait;
use reqwest::StatusCode;
use serde::Deserialize;
use tracing::{debug, warn};

use reporter_core::{config::ApiConfig, ReportId};

use crate::client::{ClientError, CreateOutcome, FetchOutcome, ReportClient};

/// `ReportClient` over the service's REST API.
///
/// `PUT {base}/reports/{id}` creates, `GET {base}/reports/{id}` fetches.
pub struct HttpReportClient {
    client: reqwest::Client,
    base_url: String,
    token: String,
}

impl HttpReportClient {
    pub fn new(api: &ApiConfig) -> Result<Self, ClientError> {
        let client = reqwest::Client::builder().timeout(api.timeout()).build()?;
        Ok(Self {
            client,
            base_url: api.base_url.trim_end_matches('/').to_string(),
            token: api.token.clone(),
        })
    }

    fn report_url(&self, id: &ReportId) -> String {
        format!("{}/reports/{}", self.base_url, id)
    }
}

#[async_trait]
impl ReportClient for HttpReportClient {
    async fn create_report(&self, id: &ReportId) -> Result<CreateOutcome, ClientError> {
        let url = self.report_url(id);
        debug!(report_id = %id, %url, "PUT report");

        let resp = self
            .client
            .put(&url)
            .bearer_auth(&self.token)
            .send()
            .await?;

        let status = resp.status();
        if let Some(outcome) = create_outcome(id, status) {
            return Ok(outcome);
        }
        Err(unexpected(resp).await)
    }

    async fn fetch_report(&self, id: &ReportId) -> Result<FetchOutcome, ClientError> {
        let url = self.report_url(id);
        debug!(report_id = %id, %url, "GET report");

        let resp = self
            .client
            .get(&url)
            .bearer_auth(&self.token)
            .send()
            .await?;

        let status = resp.status();
        if status == StatusCode::OK {
            let text = resp.text().await?;
            let body: ReportBody = serde_json::from_str(&text)
                .map_err(|e| ClientError::Decode(format!("report {id}: {e}")))?;
            return Ok(FetchOutcome::Ready(body.value));
        }
        if let Some(outcome) = pending_outcome(status) {
            return Ok(outcome);
        }
        Err(unexpected(resp).await)
    }
}

#[derive(Deserialize)]
struct ReportBody {
    value: serde_json::Value,
}

/// Map a create response status to its domain outcome. `None` means the
/// status is outside the contract.
pub fn create_outcome(id: &ReportId, status: StatusCode) -> Option<CreateOutcome> {
    match status {
        StatusCode::CREATED => Some(CreateOutcome::Created(id.clone())),
        StatusCode::CONFLICT => Some(CreateOutcome::AlreadyExists(id.clone())),
        _ => None,
    }
}

/// Map a non-200 fetch status to its domain outcome.
pub fn pending_outcome(status: StatusCode) -> Option<FetchOutcome> {
    match status {
        StatusCode::ACCEPTED => Some(FetchOutcome::NotReady),
        StatusCode::NOT_FOUND => Some(FetchOutcome::NotFound),
        _ => None,
    }
}

async fn unexpected(resp: reqwest::Response) -> ClientError {
    let status = resp.status().as_u16();
    let body = resp.text().await.unwrap_or_default();
    warn!(status, body = %body, "report service error");
    ClientError::UnexpectedStatus { status, body }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn create_status_mapping() {
        let id = ReportId::from("r1");
        assert_eq!(
            create_outcome(&id, StatusCode::CREATED),
            Some(CreateOutcome::Created(id.clone()))
        );
        assert_eq!(
            create_outcome(&id, StatusCode::CONFLICT),
            Some(CreateOutcome::AlreadyExists(id.clone()))
        );
        // 200 is not part of the create contract
        assert_eq!(create_outcome(&id, StatusCode::OK), None);
        assert_eq!(create_outcome(&id, StatusCode::INTERNAL_SERVER_ERROR), None);
    }

    #[test]
    fn fetch_status_mapping() {
        assert_eq!(pending_outcome(StatusCode::ACCEPTED), Some(FetchOutcome::NotReady));
        assert_eq!(pending_outcome(StatusCode::NOT_FOUND), Some(FetchOutcome::NotFound));
        assert_eq!(pending_outcome(StatusCode::UNAUTHORIZED), None);
        assert_eq!(pending_outcome(StatusCode::BAD_GATEWAY), None);
    }

    #[test]
    fn report_url_strips_trailing_slash() {
        let api = ApiConfig {
            base_url: "http://svc/api/v0.1/".to_string(),
            token: "t".to_string(),
            timeout_secs: 5,
        };
        let client = HttpReportClient::new(&api).unwrap();
        assert_eq!(
            client.report_url(&ReportId::from("abc")),
            "http://svc/api/v0.1/reports/abc"
        );
    }
}
