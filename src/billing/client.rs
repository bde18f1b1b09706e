use crate::billing::hooks::{RequestHook, ResponseHook};
use crate::billing::mapper::{map_order, map_payment, map_status, Mapped, RawResponse};
use crate::billing::types::{
    OrderRequest, OrderResponse, OrderStatusRequest, OrderStatusResponse, PaymentRequest,
    PaymentResponse, PaymentStatusResponse,
};
use crate::config::{BillingConfig, DEFAULT_USER_AGENT};
use crate::error::{BillingError, BillingResult, HookStage};
use crate::logging::DUMP_TARGET;
use crate::signature::sign_payment_request;
use reqwest::header::{CONTENT_TYPE, USER_AGENT};
use reqwest::{Client, Method, Url};
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};

const ORDER_WEBHOOK_PATH: [&str; 2] = ["2021-10-01", "billing-webhook"];
const PAYMENT_WEBHOOK_PATH: [&str; 3] = ["2023-05-03", "payment-webhook", ""];

/// HTTP client for the billing service.
///
/// Every operation is one request and one response. Nothing is retried.
pub struct BillingClient {
    config: Arc<BillingConfig>,
    endpoint: Url,
    http: Client,
    user_agent: String,
    request_hook: Option<Arc<dyn RequestHook>>,
    response_hook: Option<Arc<dyn ResponseHook>>,
}

pub struct BillingClientBuilder {
    config: Arc<BillingConfig>,
    endpoint: Option<String>,
    http: Option<Client>,
    user_agent: Option<String>,
    request_hook: Option<Arc<dyn RequestHook>>,
    response_hook: Option<Arc<dyn ResponseHook>>,
}

impl BillingClientBuilder {
    /// Override the environment's base URL
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = Some(endpoint.into());
        self
    }

    /// Use a preconfigured HTTP client (certificates, proxies, timeouts)
    pub fn with_http_client(mut self, http: Client) -> Self {
        self.http = Some(http);
        self
    }

    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = Some(user_agent.into());
        self
    }

    pub fn with_request_hook(mut self, hook: impl RequestHook + 'static) -> Self {
        self.request_hook = Some(Arc::new(hook));
        self
    }

    pub fn with_response_hook(mut self, hook: impl ResponseHook + 'static) -> Self {
        self.response_hook = Some(Arc::new(hook));
        self
    }

    pub fn build(self) -> BillingResult<BillingClient> {
        let mut endpoint = self
            .endpoint
            .unwrap_or_else(|| self.config.base_url.clone());
        if !endpoint.ends_with('/') {
            endpoint.push('/');
        }
        let endpoint = Url::parse(&endpoint).map_err(|e| BillingError::InvalidUrl {
            message: format!("{}: {}", endpoint, e),
        })?;
        if endpoint.cannot_be_a_base() {
            return Err(BillingError::InvalidUrl {
                message: format!("{} cannot be used as a base URL", endpoint),
            });
        }

        let http = match self.http {
            Some(http) => http,
            None => Client::builder()
                .timeout(Duration::from_secs(self.config.request_timeout))
                .build()
                .map_err(|e| BillingError::Network {
                    message: format!("failed to initialize HTTP client: {}", e),
                })?,
        };

        let user_agent = self
            .user_agent
            .filter(|ua| !ua.trim().is_empty())
            .or_else(|| Some(self.config.user_agent.clone()).filter(|ua| !ua.trim().is_empty()))
            .unwrap_or_else(|| DEFAULT_USER_AGENT.to_string());

        Ok(BillingClient {
            config: self.config,
            endpoint,
            http,
            user_agent,
            request_hook: self.request_hook,
            response_hook: self.response_hook,
        })
    }
}

impl BillingClient {
    pub fn builder(config: Arc<BillingConfig>) -> BillingClientBuilder {
        BillingClientBuilder {
            config,
            endpoint: None,
            http: None,
            user_agent: None,
            request_hook: None,
            response_hook: None,
        }
    }

    pub fn new(config: Arc<BillingConfig>) -> BillingResult<Self> {
        Self::builder(config).build()
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    pub fn user_agent(&self) -> &str {
        &self.user_agent
    }

    pub fn config(&self) -> &BillingConfig {
        &self.config
    }

    /// `POST order/create`. The request's webhook is pointed at
    /// `{app_base_url}/2021-10-01/billing-webhook/{transaction_id}`.
    pub async fn create_order(
        &self,
        transaction_id: &str,
        mut request: OrderRequest,
    ) -> BillingResult<Mapped<OrderResponse>> {
        let [version, resource] = ORDER_WEBHOOK_PATH;
        request.webhook = self.webhook_url([version, resource, transaction_id])?;
        let raw = self
            .send(Method::POST, &["order", "create"], Some(&request))
            .await?;
        map_order(&raw, transaction_id, self.config.decode_policy)
    }

    /// `POST order/check`
    pub async fn get_order_status(
        &self,
        request: &OrderStatusRequest,
    ) -> BillingResult<OrderStatusResponse> {
        let raw = self
            .send(Method::POST, &["order", "check"], Some(request))
            .await?;
        map_status(&raw, self.config.decode_policy)
    }

    /// `POST billing/payment/init`, signed with the payment-request hash.
    pub async fn create_payment(
        &self,
        mut request: PaymentRequest,
    ) -> BillingResult<Mapped<PaymentResponse>> {
        request.webhook = self.webhook_url(PAYMENT_WEBHOOK_PATH)?;
        sign_payment_request(&mut request);
        let raw = self
            .send(Method::POST, &["billing", "payment", "init"], Some(&request))
            .await?;
        map_payment(&raw, &request, self.config.decode_policy)
    }

    /// `GET payment/{token}`
    pub async fn get_payment_status(
        &self,
        payment_token: &str,
    ) -> BillingResult<PaymentStatusResponse> {
        let raw = self
            .send::<()>(Method::GET, &["payment", payment_token], None)
            .await?;
        map_status(&raw, self.config.decode_policy)
    }

    /// Join percent-encoded `segments` under `app_base_url`
    fn webhook_url<'a>(
        &self,
        segments: impl IntoIterator<Item = &'a str>,
    ) -> BillingResult<String> {
        let invalid = || BillingError::InvalidUrl {
            message: format!(
                "app base URL {:?} cannot be used for webhooks",
                self.config.app_base_url
            ),
        };
        let mut url = Url::parse(self.config.app_base_url.trim()).map_err(|_| invalid())?;
        url.path_segments_mut()
            .map_err(|_| invalid())?
            .pop_if_empty()
            .extend(segments);
        Ok(url.into())
    }

    fn url_for(&self, segments: &[&str]) -> BillingResult<Url> {
        let mut url = self.endpoint.clone();
        url.path_segments_mut()
            .map_err(|_| BillingError::InvalidUrl {
                message: format!("{} cannot be used as a base URL", self.endpoint),
            })?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    async fn send<B: Serialize + ?Sized>(
        &self,
        method: Method,
        segments: &[&str],
        body: Option<&B>,
    ) -> BillingResult<RawResponse> {
        let url = self.url_for(segments)?;
        let mut builder = self
            .http
            .request(method, url)
            .header(CONTENT_TYPE, "application/json")
            .header(USER_AGENT, &self.user_agent);
        if let Some(body) = body {
            let payload = serde_json::to_vec(body).map_err(|e| BillingError::Encode {
                message: e.to_string(),
            })?;
            builder = builder.body(payload);
        }
        let mut request = builder.build().map_err(|e| BillingError::Encode {
            message: format!("failed to build request: {}", e),
        })?;

        if let Some(hook) = &self.request_hook {
            hook.before_request(&mut request)
                .map_err(|e| BillingError::hook(HookStage::BeforeRequest, e.to_string()))?;
        }

        if self.config.debug {
            dump_request(&request);
        }
        debug!(method = %request.method(), url = %request.url(), "sending billing request");

        let response = self.http.execute(request).await?;
        let status = response.status();
        let headers = response.headers().clone();
        let body = response.bytes().await?.to_vec();
        let raw = RawResponse {
            status,
            headers,
            body,
        };

        if self.config.debug {
            dump_response(&raw);
        }

        if let Some(hook) = &self.response_hook {
            hook.after_response(&raw)
                .map_err(|e| BillingError::hook(HookStage::AfterResponse, e.to_string()))?;
        }

        Ok(raw)
    }
}

impl std::fmt::Debug for BillingClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BillingClient")
            .field("endpoint", &self.endpoint.as_str())
            .field("user_agent", &self.user_agent)
            .field("environment", &self.config.environment)
            .field("request_hook", &self.request_hook.is_some())
            .field("response_hook", &self.response_hook.is_some())
            .finish()
    }
}

fn dump_request(request: &reqwest::Request) {
    let body = request
        .body()
        .and_then(|b| b.as_bytes())
        .map(|b| String::from_utf8_lossy(b).into_owned())
        .unwrap_or_default();
    info!(
        target: DUMP_TARGET,
        method = %request.method(),
        url = %request.url(),
        headers = ?request.headers(),
        body = %body,
        "DumpRequest"
    );
}

fn dump_response(response: &RawResponse) {
    info!(
        target: DUMP_TARGET,
        status = response.status.as_u16(),
        headers = ?response.headers,
        body = %response.body_text(),
        "DumpResponse"
    );
}
