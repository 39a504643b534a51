use std::ops::ControlFlow;

use qbo_transport::{AuthenticatedTransport, BearerTransport, HeaderMap, Part, RawResponse};
use tracing::{debug, trace};

use crate::adapter;
use crate::classify::check_response;
use crate::config::{Environment, ServiceConfig};
use crate::entities::Attachable;
use crate::entity::{Entity, Persistable};
use crate::error::{ApiError, Result};
use crate::request::{QuerySpec, RequestBuilder, DEFAULT_PAGE, DEFAULT_PER_PAGE, MAX_PER_PAGE};
use crate::xml::{detect_delete_confirmation, project_collection, project_single, Collection, Document};

/// Multipart field name of the uploaded file
const FILE_FIELD: &str = "file_content_01";

/// A client bound to one company of the accounting service
///
/// Each call performs exactly one blocking request/response round trip
/// (`query_in_batches` and `all` perform one per page). The most recent raw
/// response, its parsed document and the request body that produced it are
/// kept for diagnostics and overwritten by the next call.
///
/// All calls take `&mut self`: one client serves one caller at a time.
/// Concurrent callers should each own a client; sharing one across threads
/// requires the caller's own synchronization.
///
/// # Example
///
/// ```rust,ignore
/// use qbo_api::{QboClient, ServiceConfig, Environment};
/// use qbo_api::entities::Customer;
///
/// let config = ServiceConfig::new()
///     .with_access_token(token)
///     .with_company_id("9130")
///     .with_environment(Environment::Sandbox);
/// let mut client = QboClient::from_config(&config)?;
///
/// let page = client.query::<Customer>(None, 1, 20)?;
/// for customer in page.entries {
///     println!("{:?}", customer.display_name);
/// }
/// ```
#[derive(Debug)]
pub struct QboClient<T = BearerTransport> {
    transport: Option<T>,
    company_id: Option<String>,
    base_url: String,
    minor_version: Option<u32>,
    log_bodies: bool,
    last_response: Option<RawResponse>,
    last_document: Option<Document>,
    last_request_body: Option<String>,
}

impl QboClient<BearerTransport> {
    /// Build a client whose transport authorizes with the configured access token
    ///
    /// Without a token the client has no transport and every call fails with
    /// [`ApiError::Unauthenticated`]. Fails only if the HTTP client cannot be
    /// set up.
    pub fn from_config(config: &ServiceConfig) -> Result<Self> {
        let transport = config
            .access_token
            .as_deref()
            .map(BearerTransport::new)
            .transpose()?;
        Ok(Self::with_config(transport, config))
    }
}

impl<T: AuthenticatedTransport> QboClient<T> {
    pub fn new(transport: T, company_id: impl Into<String>, environment: Environment) -> Self {
        let config = ServiceConfig::new()
            .with_company_id(company_id)
            .with_environment(environment);
        Self::with_config(Some(transport), &config)
    }

    /// Build a client around a caller-supplied transport
    pub fn with_config(transport: Option<T>, config: &ServiceConfig) -> Self {
        Self {
            transport,
            company_id: config.company_id.clone(),
            base_url: config.resolved_base_url(),
            minor_version: config.minor_version,
            log_bodies: config.log_bodies,
            last_response: None,
            last_document: None,
            last_request_body: None,
        }
    }

    pub fn set_transport(&mut self, transport: T) {
        self.transport = Some(transport);
    }

    pub fn set_company_id(&mut self, company_id: impl Into<String>) {
        self.company_id = Some(company_id.into());
    }

    pub fn company_id(&self) -> Option<&str> {
        self.company_id.as_deref()
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn is_authenticated(&self) -> bool {
        self.transport.is_some()
    }

    pub fn last_response(&self) -> Option<&RawResponse> {
        self.last_response.as_ref()
    }

    pub fn last_document(&self) -> Option<&Document> {
        self.last_document.as_ref()
    }

    pub fn last_request_body(&self) -> Option<&str> {
        self.last_request_body.as_deref()
    }

    pub fn request_builder(&self) -> RequestBuilder<'_> {
        RequestBuilder::new(&self.base_url, self.company_id.as_deref())
    }

    pub fn resource_url(&self, resource: &str) -> Result<String> {
        self.request_builder().resource_url(resource)
    }

    /// Query URL for `E`, using `E::default_query()` when `filter` is `None`
    pub fn query_url<E: Entity>(&self, filter: Option<&str>, page: u32, per_page: u32) -> Result<String> {
        let spec = QuerySpec::for_entity::<E>(filter, page, per_page)?;
        self.request_builder().query_url(&spec)
    }

    /// Fetch one entity by id; `Ok(None)` when the response holds no such entity
    pub fn fetch_by_id<E: Entity>(&mut self, id: &str) -> Result<Option<E>> {
        let url = self.request_builder().entity_url(E::RESOURCE, id)?;
        self.do_get(&url, &[])?;
        project_single(self.document()?)
    }

    /// Fetch one page of query results
    pub fn query<E: Entity>(
        &mut self,
        filter: Option<&str>,
        page: u32,
        per_page: u32,
    ) -> Result<Collection<E>> {
        let url = self.query_url::<E>(filter, page, per_page)?;
        self.do_get(&url, &[])?;
        project_collection(self.document()?)
    }

    /// First page of entities whose `field` equals `value`
    pub fn find_by<E: Entity>(&mut self, field: &str, value: &str) -> Result<Collection<E>> {
        let filter = format!(
            "SELECT * FROM {} WHERE {} = '{}'",
            E::XML_NODE,
            field,
            value.replace('\'', "\\'")
        );
        self.query(Some(&filter), DEFAULT_PAGE, DEFAULT_PER_PAGE)
    }

    /// Walk every page of a query, handing each to `f` with its page number
    ///
    /// Stops after a short page or when `f` breaks. `per_page` is capped at
    /// [`MAX_PER_PAGE`], the largest page the service returns.
    pub fn query_in_batches<E, F>(&mut self, filter: Option<&str>, per_page: u32, mut f: F) -> Result<()>
    where
        E: Entity,
        F: FnMut(Collection<E>, u32) -> ControlFlow<()>,
    {
        let per_page = per_page.min(MAX_PER_PAGE);
        let mut page = DEFAULT_PAGE;
        loop {
            let batch = self.query::<E>(filter, page, per_page)?;
            let short = batch.count < per_page as usize;
            if f(batch, page).is_break() || short {
                return Ok(());
            }
            page += 1;
        }
    }

    /// Every entity matching `filter`, across all pages
    pub fn all<E: Entity>(&mut self, filter: Option<&str>) -> Result<Vec<E>> {
        let mut entries = Vec::new();
        self.query_in_batches::<E, _>(filter, MAX_PER_PAGE, |batch, _| {
            entries.extend(batch.entries);
            ControlFlow::Continue(())
        })?;
        Ok(entries)
    }

    /// Create `entity`, returning the stored version
    pub fn create<E: Persistable>(&mut self, entity: &E) -> Result<Option<E>> {
        let url = self.resource_url(E::RESOURCE)?;
        self.do_post(&url, entity.to_xml(), &[])?;
        project_single(self.document()?)
    }

    /// Update `entity`; it must carry an id
    pub fn update<E: Persistable>(&mut self, entity: &E) -> Result<Option<E>> {
        let url = self.resource_url(E::RESOURCE)?;
        require_id(entity, "update")?;
        self.do_post(&url, entity.to_xml(), &[])?;
        project_single(self.document()?)
    }

    /// Delete `entity`; true when the service confirms the deletion
    pub fn delete<E: Persistable>(&mut self, entity: &E) -> Result<bool> {
        let url = self.resource_url(E::RESOURCE)?;
        require_id(entity, "delete")?;
        self.do_post(&url, entity.delete_xml(), &[("operation", "delete")])?;
        Ok(detect_delete_confirmation::<E>(self.document()?))
    }

    /// Upload a file, optionally with a metadata entity linking it elsewhere
    pub fn upload<M: Persistable>(
        &mut self,
        file_name: &str,
        content_type: &str,
        data: Vec<u8>,
        metadata: Option<&M>,
    ) -> Result<Collection<Attachable>> {
        let url = self.resource_url("upload")?;
        let metadata = metadata.map(M::to_xml);
        let params = self.params(&[]);
        self.begin_request();

        let fields = vec![Part::file(FILE_FIELD, file_name, content_type, data)];
        let response = adapter::upload(self.transport.as_ref(), &url, fields, metadata.as_deref(), &params)?;
        self.handle_response(response, metadata)?;
        project_collection(self.document()?)
    }

    fn do_get(&mut self, url: &str, extra: &[(&str, &str)]) -> Result<()> {
        let params = self.params(extra);
        self.begin_request();

        let response = adapter::get(self.transport.as_ref(), url, &params, HeaderMap::new())?;
        self.handle_response(response, None)
    }

    fn do_post(&mut self, url: &str, body: String, extra: &[(&str, &str)]) -> Result<()> {
        let params = self.params(extra);
        self.begin_request();

        if self.log_bodies {
            trace!(%body, "request body");
        }
        let response = adapter::post(self.transport.as_ref(), url, &body, &params, HeaderMap::new())?;
        self.handle_response(response, Some(body))
    }

    fn begin_request(&mut self) {
        self.last_response = None;
        self.last_document = None;
        self.last_request_body = None;
    }

    fn handle_response(&mut self, response: RawResponse, request_body: Option<String>) -> Result<()> {
        if self.log_bodies {
            trace!(status = response.status, body = %response.body, "response body");
        }

        let document = Document::parse(&response.body);
        let outcome = check_response(&response, &document, request_body.as_deref());
        if let Err(e) = &outcome {
            debug!(error = %e, "request failed");
        }

        self.last_response = Some(response);
        self.last_document = Some(document);
        self.last_request_body = request_body;
        outcome
    }

    fn document(&self) -> Result<&Document> {
        self.last_document
            .as_ref()
            .ok_or_else(|| ApiError::parsing("no response document available"))
    }

    fn params(&self, extra: &[(&str, &str)]) -> Vec<(String, String)> {
        let mut params: Vec<(String, String)> = extra
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        if let Some(minor) = self.minor_version {
            params.push(("minorversion".to_string(), minor.to_string()));
        }
        params
    }
}

fn require_id<E: Persistable>(entity: &E, operation: &str) -> Result<()> {
    match entity.id() {
        Some(id) if !id.is_empty() => Ok(()),
        _ => Err(ApiError::InvalidEntity(format!(
            "cannot {} a {} without an Id",
            operation,
            E::XML_NODE
        ))),
    }
}
