use std::time::Duration;

use async_trait::async_trait;
use url::Url;

use crate::error::AutomationError;

/// Port to the coordinator's web control API. Methods return the HTTP status
/// of the response; transport failures are errors.
#[async_trait]
pub trait CoordinatorControl {
    async fn probe(&self) -> Result<u16, AutomationError>;

    async fn start(&self, users: u64, hatch_rate: u64) -> Result<u16, AutomationError>;

    async fn stop(&self) -> Result<u16, AutomationError>;

    async fn report(&self) -> Result<(u16, Vec<u8>), AutomationError>;
}

/// `reqwest` client for a Locust master's web UI.
pub struct HttpCoordinator {
    client: reqwest::Client,
    base: Url,
}

impl HttpCoordinator {
    /// # Errors
    ///
    /// Returns an error when the control URL is invalid or the HTTP client
    /// cannot be built.
    pub fn new(control_url: &str, request_timeout: Duration) -> Result<Self, AutomationError> {
        let base = Url::parse(control_url).map_err(|err| AutomationError::InvalidControlUrl {
            url: control_url.to_owned(),
            source: err,
        })?;
        let client = reqwest::Client::builder()
            .timeout(request_timeout)
            .build()
            .map_err(|err| AutomationError::BuildClient { source: err })?;
        Ok(Self { client, base })
    }

    fn endpoint(&self, path: &str) -> Result<Url, AutomationError> {
        self.base
            .join(path)
            .map_err(|err| AutomationError::InvalidControlUrl {
                url: format!("{}{}", self.base, path),
                source: err,
            })
    }
}

async fn send(
    request: reqwest::RequestBuilder,
    endpoint: &Url,
) -> Result<reqwest::Response, AutomationError> {
    request
        .send()
        .await
        .map_err(|err| request_error(endpoint, err))
}

fn request_error(endpoint: &Url, err: reqwest::Error) -> AutomationError {
    AutomationError::Request {
        endpoint: endpoint.to_string(),
        source: Box::new(err),
    }
}

#[async_trait]
impl CoordinatorControl for HttpCoordinator {
    async fn probe(&self) -> Result<u16, AutomationError> {
        let url = self.endpoint("/")?;
        let response = send(self.client.get(url.clone()), &url).await?;
        Ok(response.status().as_u16())
    }

    async fn start(&self, users: u64, hatch_rate: u64) -> Result<u16, AutomationError> {
        let url = self.endpoint("/swarm")?;
        let form = [
            ("locust_count", users.to_string()),
            ("hatch_rate", hatch_rate.to_string()),
        ];
        let response = send(self.client.post(url.clone()).form(&form), &url).await?;
        Ok(response.status().as_u16())
    }

    async fn stop(&self) -> Result<u16, AutomationError> {
        let url = self.endpoint("/stop")?;
        let response = send(self.client.get(url.clone()), &url).await?;
        Ok(response.status().as_u16())
    }

    async fn report(&self) -> Result<(u16, Vec<u8>), AutomationError> {
        let url = self.endpoint("/htmlreport")?;
        let response = send(self.client.get(url.clone()), &url).await?;
        let status = response.status().as_u16();
        let body = response
            .bytes()
            .await
            .map_err(|err| request_error(&url, err))?;
        Ok((status, body.to_vec()))
    }
}
