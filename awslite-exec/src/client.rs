use std::fmt;
use std::sync::Arc;

use awslite_core::validate::PAGINATE_KEY;
use awslite_core::{
    resolve, validate, ConfigParams, Endpoint, Env, FsProfileReader, PaginateMode, PaginationError,
    Paginator, ProfileFileReader, RawRequest, RawResponse, ResolvedConfig, ServiceTable,
};
use chrono::Utc;
use serde_json::Value as JsonValue;
use tracing::debug;
use url::Url;

use crate::builder::{canonicalize_unions, to_http};
use crate::config::ClientConfig;
use crate::decode::decode_body;
use crate::error::Error;
use crate::http::{HttpClient, ReqwestHttpClient};
use crate::paginator::{PageIterator, Shape};
use crate::signer::{SigV4Signer, Signer, SigningContext};
use crate::transport;

/// Result of a call: a shaped value, or a page iterator for `paginate: "iterator"`.
#[derive(Debug)]
pub enum CallOutput {
    Result(JsonValue),
    Pages(PageIterator),
}

impl CallOutput {
    pub fn into_result(self) -> Option<JsonValue> {
        match self {
            Self::Result(v) => Some(v),
            Self::Pages(_) => None,
        }
    }

    pub fn into_pages(self) -> Option<PageIterator> {
        match self {
            Self::Pages(p) => Some(p),
            Self::Result(_) => None,
        }
    }
}

/// Where and how a request is sent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Route {
    pub(crate) service: String,
    pub(crate) endpoint: Url,
    pub(crate) signing_region: String,
}

struct ClientInner {
    config: ClientConfig,
    resolved: ResolvedConfig,
    env: Env,
    profile_reader: Arc<dyn ProfileFileReader>,
    http: Arc<dyn HttpClient>,
    signer: Arc<dyn Signer>,
}

/// Cheap to clone; every clone and every page iterator shares the same immutable state.
#[derive(Clone)]
pub struct Client {
    inner: Arc<ClientInner>,
}

impl fmt::Debug for Client {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Client")
            .field("region", &self.inner.resolved.region)
            .field("profile", &self.inner.resolved.profile)
            .field("endpoint", &self.inner.config.endpoint)
            .finish()
    }
}

pub struct ClientBuilder {
    config: ClientConfig,
    env: Option<Env>,
    profile_reader: Option<Arc<dyn ProfileFileReader>>,
    http: Option<Arc<dyn HttpClient>>,
    signer: Option<Arc<dyn Signer>>,
}

impl ClientBuilder {
    /// Environment snapshot; defaults to the current process environment.
    pub fn env(mut self, env: Env) -> Self {
        self.env = Some(env);
        self
    }

    pub fn profile_reader(mut self, reader: Arc<dyn ProfileFileReader>) -> Self {
        self.profile_reader = Some(reader);
        self
    }

    pub fn http_client(mut self, http: Arc<dyn HttpClient>) -> Self {
        self.http = Some(http);
        self
    }

    pub fn signer(mut self, signer: Arc<dyn Signer>) -> Self {
        self.signer = Some(signer);
        self
    }

    /// Resolve region and credentials and assemble the client.
    pub fn build(self) -> Result<Client, Error> {
        let env = self.env.unwrap_or_else(Env::from_process);
        let profile_reader = self
            .profile_reader
            .unwrap_or_else(|| Arc::new(FsProfileReader));
        let resolved = resolve(&self.config.params, &env, profile_reader.as_ref())?;
        let http = match self.http {
            Some(http) => http,
            None => Arc::new(ReqwestHttpClient::new()?),
        };
        let signer = self.signer.unwrap_or_else(|| Arc::new(SigV4Signer));
        debug!(region = %resolved.region, profile = %resolved.profile, "client ready");

        Ok(Client {
            inner: Arc::new(ClientInner {
                config: self.config,
                resolved,
                env,
                profile_reader,
                http,
                signer,
            }),
        })
    }
}

impl Client {
    pub fn builder(config: ClientConfig) -> ClientBuilder {
        ClientBuilder {
            config,
            env: None,
            profile_reader: None,
            http: None,
            signer: None,
        }
    }

    pub fn region(&self) -> &str {
        &self.inner.resolved.region
    }

    pub fn resolved(&self) -> &ResolvedConfig {
        &self.inner.resolved
    }

    pub fn config(&self) -> &ClientConfig {
        &self.inner.config
    }

    /// A client with `params` layered over this one's, re-resolved once. Transport and
    /// signer are shared.
    pub fn with_overrides(&self, params: ConfigParams) -> Result<Client, Error> {
        let inner = &self.inner;
        let mut config = inner.config.clone();
        config.params = params.merged_over(&inner.config.params);
        let resolved = resolve(&config.params, &inner.env, inner.profile_reader.as_ref())?;
        Ok(Client {
            inner: Arc::new(ClientInner {
                config,
                resolved,
                env: inner.env.clone(),
                profile_reader: Arc::clone(&inner.profile_reader),
                http: Arc::clone(&inner.http),
                signer: Arc::clone(&inner.signer),
            }),
        })
    }

    /// Invoke `operation` from `table` with JSON arguments.
    pub async fn call(
        &self,
        table: &ServiceTable,
        operation: &str,
        args: JsonValue,
    ) -> Result<CallOutput, Error> {
        let descriptor = table.get(operation).ok_or_else(|| Error::UnknownOperation {
            service: table.service.to_string(),
            operation: operation.to_string(),
        })?;

        let mut args = validate(descriptor.validate, args, descriptor.strictness)?.into_inner();
        let mode = match args.remove(PAGINATE_KEY) {
            Some(value) => PaginateMode::from_value(&value)?,
            None => None,
        };
        canonicalize_unions(descriptor.validate, &mut args)?;

        let raw = (descriptor.request)(&args);
        let route = self.route(table.service, table.endpoint)?;
        self.dispatch(
            descriptor.name,
            route,
            raw,
            mode,
            descriptor.paginator.as_ref(),
            descriptor.response,
        )
        .await
    }

    /// Send a request without a descriptor. The result is `{ statusCode, headers, payload }`.
    pub async fn request(&self, service: &str, raw: RawRequest) -> Result<CallOutput, Error> {
        let route = self.route(service, Endpoint::Regional)?;
        self.dispatch(service, route, raw, None, None, RawResponse::into_value)
            .await
    }

    async fn dispatch(
        &self,
        name: &str,
        route: Route,
        mut raw: RawRequest,
        mode: Option<PaginateMode>,
        default_paginator: Option<&Paginator>,
        shape: Shape,
    ) -> Result<CallOutput, Error> {
        let Some(mode) = raw.paginate.take().or(mode) else {
            let response = self.send_raw(&route, &raw).await?;
            return Ok(CallOutput::Result(shape(response)));
        };

        let paginator = match (raw.paginator.take(), default_paginator) {
            (Some(over), Some(base)) => over.merged_over(base),
            (Some(over), None) => over,
            (None, Some(base)) => base.clone(),
            (None, None) => return Err(PaginationError::NotPaginated(name.to_string()).into()),
        };
        let spec = paginator.resolve()?;
        if mode == PaginateMode::Auto && spec.accumulator.is_none() {
            return Err(PaginationError::MissingField("accumulator").into());
        }

        let pages = PageIterator::new(self.clone(), route, raw, spec, shape)?;
        match mode {
            PaginateMode::Auto => Ok(CallOutput::Result(pages.collect_all().await?)),
            PaginateMode::Iterator => Ok(CallOutput::Pages(pages)),
        }
    }

    fn route(&self, service: &str, endpoint: Endpoint) -> Result<Route, Error> {
        let region = &self.inner.resolved.region;
        let (derived, signing_region) = match endpoint {
            Endpoint::Regional => (
                format!("https://{service}.{region}.amazonaws.com"),
                region.clone(),
            ),
            Endpoint::Global {
                host,
                signing_region,
            } => (format!("https://{host}"), signing_region.to_string()),
        };
        let endpoint = match &self.inner.config.endpoint {
            Some(url) => url.clone(),
            None => Url::parse(&derived)
                .map_err(|e| Error::InvalidRequest(format!("invalid endpoint `{derived}`: {e}")))?,
        };
        Ok(Route {
            service: service.to_string(),
            endpoint,
            signing_region,
        })
    }

    pub(crate) async fn send_raw(
        &self,
        route: &Route,
        raw: &RawRequest,
    ) -> Result<RawResponse, Error> {
        let inner = &self.inner;
        let request = to_http(raw, &route.endpoint)?;
        let credentials = &inner.resolved.credentials;
        let signer = inner.signer.as_ref();

        let response = transport::execute(
            inner.http.as_ref(),
            &request,
            &inner.config.retry,
            inner.config.limits(),
            |req| {
                signer.sign(
                    req,
                    &SigningContext {
                        service: &route.service,
                        region: &route.signing_region,
                        credentials,
                        time: Utc::now(),
                    },
                )
            },
        )
        .await?;

        let payload = decode_body(&response.headers, &response.body)?;
        Ok(RawResponse {
            status_code: response.status,
            headers: response.headers,
            payload,
        })
    }
}
