//! HTTP carrier for backend commands: `POST {base}/invoke/{command}` with
//! the argument bag as the JSON body.

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde_json::Value;
use shared::{
    error::{ErrorCode, InvokeError},
    protocol::Command,
};
use tracing::{debug, warn};
use url::Url;

use crate::Invoker;

pub struct HttpInvoker {
    http: Client,
    base: Url,
}

impl HttpInvoker {
    pub fn new(endpoint: &str) -> Result<Self, InvokeError> {
        Self::with_client(Client::new(), endpoint)
    }

    pub fn with_client(http: Client, endpoint: &str) -> Result<Self, InvokeError> {
        let mut base = Url::parse(endpoint).map_err(|err| {
            InvokeError::new(
                ErrorCode::Validation,
                format!("invalid backend endpoint '{endpoint}': {err}"),
            )
        })?;
        if !base.path().ends_with('/') {
            let path = format!("{}/", base.path());
            base.set_path(&path);
        }
        Ok(Self { http, base })
    }

    pub fn command_url(&self, command: Command) -> Result<Url, InvokeError> {
        self.base
            .join(&format!("invoke/{}", command.name()))
            .map_err(|err| {
                InvokeError::internal(format!("failed to build url for {command}: {err}"))
            })
    }
}

#[async_trait]
impl Invoker for HttpInvoker {
    async fn invoke(&self, command: Command, args: Value) -> Result<Value, InvokeError> {
        let url = self.command_url(command)?;
        debug!(%url, command = command.name(), "posting backend command");
        let res = self
            .http
            .post(url)
            .json(&args)
            .send()
            .await
            .map_err(|err| InvokeError::transport(format!("{command} request failed: {err}")))?;

        let status = res.status();
        let body = res
            .text()
            .await
            .map_err(|err| InvokeError::transport(format!("{command} reply unreadable: {err}")))?;

        if !status.is_success() {
            warn!(command = command.name(), %status, "backend command rejected");
            return Err(rejection(status, &body));
        }
        if body.trim().is_empty() {
            return Ok(Value::Null);
        }
        serde_json::from_str(&body)
            .map_err(|err| InvokeError::internal(format!("{command} reply is not JSON: {err}")))
    }
}

fn rejection(status: StatusCode, body: &str) -> InvokeError {
    if let Ok(err) = serde_json::from_str::<InvokeError>(body) {
        return err;
    }
    let code = match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => ErrorCode::Unauthorized,
        StatusCode::NOT_FOUND => ErrorCode::NotFound,
        StatusCode::BAD_REQUEST | StatusCode::UNPROCESSABLE_ENTITY => ErrorCode::Validation,
        _ => ErrorCode::Transport,
    };
    let message = if body.trim().is_empty() {
        status.to_string()
    } else {
        format!("{status}: {}", body.trim())
    };
    InvokeError::new(code, message)
}

#[cfg(test)]
#[path = "tests/transport_tests.rs"]
mod tests;
