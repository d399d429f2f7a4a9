use gaam_shared::gaam::GaamInfo;
use reqwest::{RequestBuilder, Response};

/// Lists every gaam, for the registration form.
pub struct List;

#[async_trait::async_trait]
impl super::Request for List {
    type Output = Vec<GaamInfo>;
    const URL_SUFFIX: &'static str = "/api/gaam/list";

    fn make_req(&self, req: RequestBuilder) -> anyhow::Result<RequestBuilder> {
        Ok(req)
    }

    async fn parse_res(&mut self, response: Response) -> anyhow::Result<Self::Output> {
        super::parse_json(response).await
    }
}
