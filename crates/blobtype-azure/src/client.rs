//! Azure Blob Storage container client.

use std::sync::Arc;

use blobtype_core::{ObjectContainer, ObjectProperties, ObjectStream, StorageObject};
use reqwest::header::{CONTENT_LENGTH, HeaderMap, HeaderName, HeaderValue};
use reqwest::{Client, Method, Response};
use url::Url;

use crate::auth::SharedKey;
use crate::config::AzureConfig;
use crate::error::{Error, Result};
use crate::list::{ErrorBody, ListPage, parse_list_page};

/// Tracing target for Azure client operations.
pub const TRACING_TARGET: &str = "blobtype_azure::client";

/// Storage service version sent with every request.
pub const API_VERSION: &str = "2021-08-06";

const X_MS_VERSION: HeaderName = HeaderName::from_static("x-ms-version");
const X_MS_ERROR_CODE: &str = "x-ms-error-code";

/// Inner client that holds the HTTP client and resolved container location.
struct AzureBlobClientInner {
    http: Client,
    signer: SharedKey,
    container: String,
    container_url: Url,
    page_size: u32,
}

/// Client for a single Azure Blob Storage container.
///
/// Implements [`ObjectContainer`]: listing uses List Blobs with marker
/// pagination, and persisting uses Set Blob Properties, which rewrites the
/// standard properties without touching the blob body.
///
/// # Examples
///
/// ```rust,ignore
/// use blobtype_azure::{AzureBlobClient, AzureConfig};
///
/// let config = AzureConfig::new("myaccount", account_key, "media");
/// let client = AzureBlobClient::connect(&config).await?;
/// ```
#[derive(Clone)]
pub struct AzureBlobClient {
    inner: Arc<AzureBlobClientInner>,
}

impl std::fmt::Debug for AzureBlobClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AzureBlobClient")
            .field("container_url", &self.inner.container_url.as_str())
            .field("page_size", &self.inner.page_size)
            .finish_non_exhaustive()
    }
}

impl AzureBlobClient {
    /// Creates a client and verifies that the container exists and the
    /// credentials are accepted.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid, the service cannot
    /// be reached, or the container properties cannot be read.
    pub async fn connect(config: &AzureConfig) -> blobtype_core::Result<Self> {
        let client = Self::new(config)?;
        client.verify_container().await?;
        Ok(client)
    }

    /// Creates a client without contacting the service.
    ///
    /// # Errors
    ///
    /// Returns a configuration error if `config` fails validation.
    pub fn new(config: &AzureConfig) -> blobtype_core::Result<Self> {
        config.validate()?;

        let timeout = config.effective_timeout();
        let signer = SharedKey::new(&config.account_name, &config.account_key)?;
        let container_url = container_url(&config.endpoint_url()?, &config.container)?;

        tracing::debug!(
            target: TRACING_TARGET,
            container_url = %container_url,
            timeout_ms = timeout.as_millis(),
            "Creating Azure blob client"
        );

        let http = Client::builder()
            .timeout(timeout)
            .user_agent(config.user_agent())
            .build()
            .map_err(Error::from)?;

        let inner = AzureBlobClientInner {
            http,
            signer,
            container: config.container.clone(),
            container_url,
            page_size: config.effective_page_size(),
        };

        Ok(Self {
            inner: Arc::new(inner),
        })
    }

    /// URL of the container.
    pub fn container_url(&self) -> &Url {
        &self.inner.container_url
    }

    /// URL of the blob `name`, with each `/`-separated segment escaped.
    ///
    /// Names with a `.` or `..` segment are rejected: URL normalization
    /// would resolve them to a different blob.
    pub fn blob_url(&self, name: &str) -> Result<Url> {
        if name.split('/').any(|segment| matches!(segment, "." | "..")) {
            return Err(Error::InvalidUrl(format!(
                "blob name '{name}' has a relative path segment"
            )));
        }

        let mut url = self.inner.container_url.clone();
        url.path_segments_mut()
            .map_err(|()| Error::InvalidUrl(self.inner.container_url.to_string()))?
            .extend(name.split('/'));
        Ok(url)
    }

    /// Reads the container properties.
    #[tracing::instrument(
        name = "azure.verify",
        skip(self),
        fields(container = %self.inner.container)
    )]
    pub async fn verify_container(&self) -> blobtype_core::Result<()> {
        let mut url = self.inner.container_url.clone();
        url.query_pairs_mut().append_pair("restype", "container");

        self.send(Method::GET, url, HeaderMap::new()).await?;

        tracing::info!(
            target: TRACING_TARGET,
            container = %self.inner.container,
            "Container reachable"
        );
        Ok(())
    }

    /// Fetches one page of the flat blob listing.
    async fn list_page(&self, marker: Option<&str>) -> Result<ListPage> {
        let mut url = self.inner.container_url.clone();
        {
            let mut query = url.query_pairs_mut();
            query
                .append_pair("restype", "container")
                .append_pair("comp", "list")
                .append_pair("maxresults", &self.inner.page_size.to_string());
            if let Some(marker) = marker {
                query.append_pair("marker", marker);
            }
        }

        let response = self.send(Method::GET, url, HeaderMap::new()).await?;
        let body = response.text().await?;
        let page = parse_list_page(&body)?;

        tracing::debug!(
            target: TRACING_TARGET,
            container = %self.inner.container,
            objects = page.objects.len(),
            has_more = page.next_marker.is_some(),
            "Listing page fetched"
        );

        Ok(page)
    }

    /// Writes `object.properties` to the blob with Set Blob Properties.
    #[tracing::instrument(
        name = "azure.set_properties",
        skip(self, object),
        fields(object = %object.name)
    )]
    pub async fn set_properties(&self, object: &StorageObject) -> Result<()> {
        let mut url = self.blob_url(&object.name)?;
        url.query_pairs_mut().append_pair("comp", "properties");

        let headers = property_headers(&object.properties)?;
        self.send(Method::PUT, url, headers).await?;
        Ok(())
    }

    /// Signs and sends a request, turning non-success statuses into errors.
    async fn send(&self, method: Method, url: Url, headers: HeaderMap) -> Result<Response> {
        let mut builder = self
            .inner
            .http
            .request(method.clone(), url)
            .headers(headers)
            .header(X_MS_VERSION, API_VERSION);

        if method == Method::PUT {
            builder = builder.header(CONTENT_LENGTH, "0").body(Vec::new());
        }

        let mut request = builder.build()?;
        self.inner.signer.sign(&mut request)?;

        tracing::trace!(
            target: TRACING_TARGET,
            method = %request.method(),
            url = %request.url(),
            "Sending request"
        );

        let response = self.inner.http.execute(request).await?;
        if response.status().is_success() {
            return Ok(response);
        }

        Err(status_error(response).await)
    }
}

#[async_trait::async_trait]
impl ObjectContainer for AzureBlobClient {
    fn container_name(&self) -> &str {
        &self.inner.container
    }

    fn list_objects(&self) -> ObjectStream<'_> {
        let stream = async_stream::stream! {
            let mut marker: Option<String> = None;
            loop {
                let page = match self.list_page(marker.as_deref()).await {
                    Ok(page) => page,
                    Err(error) => {
                        yield Err(blobtype_core::Error::from(error));
                        break;
                    }
                };

                for object in page.objects {
                    yield Ok(object);
                }

                match page.next_marker {
                    Some(next) => marker = Some(next),
                    None => break,
                }
            }
        };

        Box::pin(stream)
    }

    async fn persist_content_type(&self, object: &StorageObject) -> blobtype_core::Result<()> {
        self.set_properties(object).await.map_err(Into::into)
    }
}

/// Resolves the container URL below `endpoint`.
fn container_url(endpoint: &Url, container: &str) -> Result<Url> {
    let mut url = endpoint.clone();
    url.set_query(None);
    url.path_segments_mut()
        .map_err(|()| Error::InvalidUrl(endpoint.to_string()))?
        .pop_if_empty()
        .push(container);
    Ok(url)
}

/// Maps standard properties onto their Set Blob Properties headers.
///
/// Unset properties are omitted, which clears them on the blob.
fn property_headers(props: &ObjectProperties) -> Result<HeaderMap> {
    let pairs = [
        ("x-ms-blob-content-type", &props.content_type),
        ("x-ms-blob-content-encoding", &props.content_encoding),
        ("x-ms-blob-content-language", &props.content_language),
        ("x-ms-blob-content-disposition", &props.content_disposition),
        ("x-ms-blob-cache-control", &props.cache_control),
        ("x-ms-blob-content-md5", &props.content_md5),
    ];

    let mut headers = HeaderMap::new();
    for (name, value) in pairs {
        if let Some(value) = value {
            headers.insert(HeaderName::from_static(name), HeaderValue::from_str(value)?);
        }
    }
    Ok(headers)
}

/// Builds a status error from a failed response.
async fn status_error(response: Response) -> Error {
    let status = response.status();
    let header_code = response
        .headers()
        .get(X_MS_ERROR_CODE)
        .and_then(|value| value.to_str().ok())
        .map(str::to_owned);

    let body = response.text().await.unwrap_or_default();
    let parsed = ErrorBody::parse(&body);

    Error::Status {
        status,
        code: header_code.or(parsed.code),
        message: parsed.message,
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use blobtype_core::{ContentTypeReset, ErrorKind, UpdateOutcome};
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    use super::*;

    const ACCOUNT: &str = "devstoreaccount1";
    const KEY: &str = "c2VjcmV0LWtleQ==";

    type Recorded = Arc<Mutex<Vec<String>>>;

    /// Serves `responses` in order, one connection per request, and records
    /// each request head (lower-cased).
    async fn serve(responses: Vec<(u16, &'static str)>) -> (String, Recorded) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let recorded: Recorded = Arc::default();

        let log = Arc::clone(&recorded);
        tokio::spawn(async move {
            for (status, body) in responses {
                let (mut socket, _) = listener.accept().await.unwrap();

                let mut head = Vec::new();
                let mut buf = [0u8; 1024];
                while !head.windows(4).any(|w| w == b"\r\n\r\n") {
                    let n = socket.read(&mut buf).await.unwrap();
                    if n == 0 {
                        break;
                    }
                    head.extend_from_slice(&buf[..n]);
                }
                log.lock()
                    .unwrap()
                    .push(String::from_utf8_lossy(&head).to_lowercase());

                let response = format!(
                    "HTTP/1.1 {status} Status\r\ncontent-type: application/xml\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{body}",
                    body.len()
                );
                socket.write_all(response.as_bytes()).await.unwrap();
                socket.shutdown().await.unwrap();
            }
        });

        (format!("http://{addr}/{ACCOUNT}"), recorded)
    }

    fn config(endpoint: &str) -> AzureConfig {
        AzureConfig::new(ACCOUNT, KEY, "media").with_endpoint(endpoint)
    }

    fn offline_client() -> AzureBlobClient {
        AzureBlobClient::new(&AzureConfig::new("myaccount", KEY, "media")).unwrap()
    }

    #[test]
    fn test_container_url() {
        let client = offline_client();
        assert_eq!(
            client.container_url().as_str(),
            "https://myaccount.blob.core.windows.net/media"
        );
    }

    #[test]
    fn test_container_url_with_path_endpoint() {
        let client = AzureBlobClient::new(&config("http://127.0.0.1:10000/devstoreaccount1/"))
            .unwrap();
        assert_eq!(
            client.container_url().as_str(),
            "http://127.0.0.1:10000/devstoreaccount1/media"
        );
    }

    #[test]
    fn test_blob_url_escapes_segments() {
        let url = offline_client()
            .blob_url("photos/summer 2024/a#1.jpg")
            .unwrap();
        assert_eq!(
            url.as_str(),
            "https://myaccount.blob.core.windows.net/media/photos/summer%202024/a%231.jpg"
        );
    }

    #[test]
    fn test_blob_url_rejects_relative_segments() {
        let client = offline_client();
        for name in ["a/../b.jpg", "a/./b.jpg", "x/..", "..", "./b.jpg"] {
            let result = client.blob_url(name);
            assert!(matches!(result, Err(Error::InvalidUrl(_))), "{name}");
        }
    }

    #[test]
    fn test_blob_url_keeps_dots_inside_segments() {
        let client = offline_client();
        let url = client.blob_url("a..b/.hidden.png").unwrap();
        assert_eq!(url.path(), "/media/a..b/.hidden.png");

        let url = client.blob_url("v1.2/.../c.jpg").unwrap();
        assert_eq!(url.path(), "/media/v1.2/.../c.jpg");
    }

    #[test]
    fn test_new_rejects_invalid_config() {
        let err = AzureBlobClient::new(&AzureConfig::new("myaccount", KEY, "")).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Configuration);
    }

    #[test]
    fn test_property_headers() {
        let headers = property_headers(&ObjectProperties {
            content_type: Some("image/jpeg".into()),
            cache_control: Some("max-age=60".into()),
            ..Default::default()
        })
        .unwrap();

        assert_eq!(headers.len(), 2);
        assert_eq!(headers["x-ms-blob-content-type"], "image/jpeg");
        assert_eq!(headers["x-ms-blob-cache-control"], "max-age=60");
    }

    #[test]
    fn test_property_headers_rejects_control_characters() {
        let result = property_headers(&ObjectProperties::with_content_type("image/jpeg\n"));
        assert!(matches!(result, Err(Error::InvalidHeader(_))));
    }

    #[tokio::test]
    async fn test_connect_verifies_container() {
        let (endpoint, recorded) = serve(vec![(200, "")]).await;

        let client = AzureBlobClient::connect(&config(&endpoint)).await.unwrap();
        assert_eq!(client.container_name(), "media");

        let requests = recorded.lock().unwrap();
        let head = &requests[0];
        let request_line = "get /devstoreaccount1/media?restype=container http/1.1";
        assert!(head.starts_with(request_line));
        assert!(head.contains("authorization: sharedkey devstoreaccount1:"));
        assert!(head.contains("x-ms-version: 2021-08-06"));
        assert!(head.contains("x-ms-date: "));
    }

    #[tokio::test]
    async fn test_connect_missing_container() {
        let body = "<?xml version=\"1.0\" encoding=\"utf-8\"?><Error><Code>ContainerNotFound</Code><Message>The specified container does not exist.</Message></Error>";
        let (endpoint, _) = serve(vec![(404, body)]).await;

        let err = AzureBlobClient::connect(&config(&endpoint))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
        assert!(err.to_string().contains("ContainerNotFound"));
    }

    #[tokio::test]
    async fn test_reset_across_pages() {
        let first_page = r#"<?xml version="1.0" encoding="utf-8"?>
<EnumerationResults ContainerName="media"><Blobs>
<Blob><Name>a.jpg</Name><Properties><Content-Type>text/plain</Content-Type></Properties></Blob>
<Blob><Name>b.png</Name><Properties><Content-Type>image/png</Content-Type></Properties></Blob>
</Blobs><NextMarker>page2</NextMarker></EnumerationResults>"#;
        let second_page = r#"<?xml version="1.0" encoding="utf-8"?>
<EnumerationResults ContainerName="media"><Blobs>
<Blob><Name>css/site.css</Name><Properties><Content-Type>application/octet-stream</Content-Type><Cache-Control>max-age=60</Cache-Control></Properties></Blob>
<Blob><Name>LICENSE</Name><Properties><Content-Type>text/plain</Content-Type></Properties></Blob>
</Blobs><NextMarker /></EnumerationResults>"#;
        let busy = "<?xml version=\"1.0\" encoding=\"utf-8\"?><Error><Code>ServerBusy</Code><Message>Busy</Message></Error>";

        let (endpoint, recorded) = serve(vec![
            (200, ""),
            (200, first_page),
            (200, ""),
            (200, second_page),
            (503, busy),
        ])
        .await;

        let client = AzureBlobClient::connect(&config(&endpoint).with_page_size(2))
            .await
            .unwrap();

        let mut failures = Vec::new();
        let summary = ContentTypeReset::default()
            .run(&client, |object, outcome| {
                if let UpdateOutcome::Failed { error, .. } = outcome {
                    failures.push((object.name.clone(), error.kind()));
                }
            })
            .await
            .unwrap();

        assert_eq!(summary.updated, 1);
        assert_eq!(summary.already_correct, 1);
        assert_eq!(summary.no_mapping, 1);
        assert_eq!(summary.failed, 1);
        assert_eq!(
            failures,
            [("css/site.css".to_owned(), ErrorKind::ExternalError)]
        );

        let requests = recorded.lock().unwrap();
        assert_eq!(requests.len(), 5);
        assert!(requests[1].contains("comp=list"));
        assert!(requests[1].contains("maxresults=2"));
        assert!(!requests[1].contains("marker="));
        let first_put = &requests[2];
        let request_line = "put /devstoreaccount1/media/a.jpg?comp=properties";
        assert!(first_put.starts_with(request_line));
        assert!(first_put.contains("x-ms-blob-content-type: image/jpeg"));
        assert!(first_put.contains("content-length: 0"));
        assert!(requests[3].contains("marker=page2"));
        let second_put = &requests[4];
        let request_line = "put /devstoreaccount1/media/css/site.css?comp=properties";
        assert!(second_put.starts_with(request_line));
        assert!(second_put.contains("x-ms-blob-content-type: text/css"));
        assert!(second_put.contains("x-ms-blob-cache-control: max-age=60"));
    }

    #[tokio::test]
    async fn test_relative_blob_name_is_not_redirected() {
        let page = r#"<?xml version="1.0" encoding="utf-8"?>
<EnumerationResults ContainerName="media"><Blobs>
<Blob><Name>x/../b.jpg</Name><Properties><Content-Type>text/plain</Content-Type></Properties></Blob>
<Blob><Name>b.jpg</Name><Properties><Content-Type>image/jpeg</Content-Type></Properties></Blob>
</Blobs><NextMarker /></EnumerationResults>"#;
        let (endpoint, recorded) = serve(vec![(200, ""), (200, page)]).await;

        let client = AzureBlobClient::connect(&config(&endpoint)).await.unwrap();
        let mut failures = Vec::new();
        let summary = ContentTypeReset::default()
            .run(&client, |object, outcome| {
                if let UpdateOutcome::Failed { error, .. } = outcome {
                    failures.push((object.name.clone(), error.kind()));
                }
            })
            .await
            .unwrap();

        assert_eq!(summary.failed, 1);
        assert_eq!(summary.updated, 0);
        assert_eq!(summary.already_correct, 1);
        assert_eq!(
            failures,
            [("x/../b.jpg".to_owned(), ErrorKind::InvalidInput)]
        );
        assert_eq!(recorded.lock().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_listing_error_surfaces() {
        let denied = "<?xml version=\"1.0\" encoding=\"utf-8\"?><Error><Code>AuthorizationPermissionMismatch</Code><Message>Denied</Message></Error>";
        let (endpoint, _) = serve(vec![(200, ""), (403, denied)]).await;

        let client = AzureBlobClient::connect(&config(&endpoint)).await.unwrap();
        let err = ContentTypeReset::default()
            .run(&client, |_, _| {})
            .await
            .unwrap_err();

        assert_eq!(err.kind(), ErrorKind::Listing);
    }
}
