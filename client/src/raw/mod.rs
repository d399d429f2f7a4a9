use std::fmt::{Formatter, Write};

pub mod account;
pub mod gaam;
pub mod manage;

#[async_trait::async_trait]
pub trait Request {
    type Output;

    const URL_SUFFIX: &'static str;
    const METHOD: reqwest::Method = reqwest::Method::POST;

    fn make_req(&self, req: reqwest::RequestBuilder) -> anyhow::Result<reqwest::RequestBuilder>;

    async fn parse_res(&mut self, response: reqwest::Response) -> anyhow::Result<Self::Output>;
}

/// A non-success response of the backend.
#[derive(Debug)]
pub struct ResponseError {
    pub status_code: reqwest::StatusCode,
    /// The `error` field of the response body, if any.
    pub error: Option<String>,
}

impl std::fmt::Display for ResponseError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.status_code.as_str())?;

        if let Some(msg) = self.status_code.canonical_reason() {
            f.write_char(' ')?;
            f.write_str(msg)?;
        }

        if let Some(ref msg) = self.error {
            f.write_str(": ")?;
            f.write_str(msg)?;
        }

        Ok(())
    }
}

impl std::error::Error for ResponseError {}

/// Calls a [`Request`] and return its output.
///
/// Non-success responses become a [`ResponseError`].
pub async fn call<T: Request>(
    mut req: T,
    cx: &crate::Context,
) -> anyhow::Result<<T as Request>::Output> {
    let response = req
        .make_req(
            cx.req_client
                .request(T::METHOD, format!("{}{}", cx.url_prefix, T::URL_SUFFIX)),
        )?
        .send()
        .await?;
    let status = response.status();

    if !status.is_success() {
        #[derive(serde::Deserialize)]
        struct ThrownError {
            error: String,
        }

        let err_msg = response
            .json::<ThrownError>()
            .await
            .ok()
            .map(|msg| msg.error);

        return Err(anyhow::Error::new(ResponseError {
            status_code: status,
            error: err_msg,
        }));
    }

    req.parse_res(response).await
}

/// Reads a json body, treating an empty body as `null`.
pub(crate) async fn parse_json<T: serde::de::DeserializeOwned>(
    response: reqwest::Response,
) -> anyhow::Result<T> {
    let bytes = response.bytes().await?;
    if bytes.is_empty() {
        Ok(serde_json::from_slice(b"null")?)
    } else {
        Ok(serde_json::from_slice(&bytes)?)
    }
}
