//! Remote call plumbing: API errors, skip classification and pagination.
use std::{future::Future, time::Duration};

use futures::Stream;

use crate::SweepContext;

/// An error produced by a single remote call.
#[derive(snafu::Snafu, Debug, Clone, PartialEq)]
#[snafu(visibility(pub(crate)))]
pub enum ApiError {
    /// The service answered with an error code.
    #[snafu(display("{code}: {message}"))]
    Service { code: String, message: String },

    /// The request never got a response (connection, DNS, dispatch...).
    #[snafu(display("request failed: {message}"))]
    Transport { message: String },

    #[snafu(display("call was cancelled"))]
    Cancelled {},

    #[snafu(display("call timed out after {after:?}"))]
    TimedOut { after: Duration },
}

impl ApiError {
    pub fn service(code: impl Into<String>, message: impl Into<String>) -> Self {
        ApiError::Service {
            code: code.into(),
            message: message.into(),
        }
    }

    pub fn transport(message: impl Into<String>) -> Self {
        ApiError::Transport {
            message: message.into(),
        }
    }

    /// The service error code, if the service responded.
    pub fn code(&self) -> Option<&str> {
        match self {
            ApiError::Service { code, .. } => Some(code),
            _ => None,
        }
    }

    pub fn message(&self) -> &str {
        match self {
            ApiError::Service { message, .. } | ApiError::Transport { message } => message,
            ApiError::Cancelled {} => "cancelled",
            ApiError::TimedOut { .. } => "timed out",
        }
    }

    pub fn code_equals(&self, code: &str) -> bool {
        self.code() == Some(code)
    }

    /// The resource is already gone.
    pub fn is_not_found(&self) -> bool {
        self.code_equals("ResourceNotFoundException")
    }
}

/// One entry of a [`SkipPolicy`].
///
/// Matches an [`ApiError`] when the error code is equal to `code` and the
/// message contains `message`. An empty `message` matches any message.
/// The code `RequestError` matches transport failures instead of service
/// errors.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct SkipPattern {
    pub code: String,
    #[serde(default)]
    pub message: String,
}

impl SkipPattern {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        SkipPattern {
            code: code.into(),
            message: message.into(),
        }
    }

    pub fn matches(&self, error: &ApiError) -> bool {
        let code_matches = match error {
            ApiError::Service { code, .. } => *code == self.code,
            ApiError::Transport { .. } => self.code == TRANSPORT_CODE,
            ApiError::Cancelled {} | ApiError::TimedOut { .. } => false,
        };
        code_matches && error.message().contains(&self.message)
    }
}

const TRANSPORT_CODE: &str = "RequestError";

/// Classifies errors that mean "this service or operation does not exist
/// here" as skips.
#[derive(Debug, Clone, PartialEq)]
pub struct SkipPolicy {
    patterns: Vec<SkipPattern>,
}

impl Default for SkipPolicy {
    fn default() -> Self {
        let patterns = [
            // no endpoint for the service in this region
            (TRANSPORT_CODE, "dns error"),
            (TRANSPORT_CODE, "failed to lookup address"),
            (TRANSPORT_CODE, "send request failed"),
            ("UnsupportedOperation", ""),
            (
                "InvalidParameterValue",
                "not permitted in this API version for your account",
            ),
            ("InvalidParameterValue", "Access Denied to API Version"),
            // GovCloud answers some endpoints without a message
            ("AccessDeniedException", ""),
            ("InvalidAction", "is not valid"),
            ("InvalidAction", "Unavailable Operation"),
            ("InvalidSignatureException", "Signature expired"),
            ("UnknownOperationException", ""),
            (
                "UnrecognizedClientException",
                "The security token included in the request is invalid",
            ),
            (
                "InvalidClientTokenId",
                "The security token included in the request is invalid",
            ),
            ("AuthorizationError", "is not authorized to perform"),
        ]
        .into_iter()
        .map(|(code, message)| SkipPattern::new(code, message))
        .collect();
        SkipPolicy { patterns }
    }
}

impl SkipPolicy {
    /// A policy that never skips.
    pub fn none() -> Self {
        SkipPolicy { patterns: vec![] }
    }

    pub fn with_pattern(mut self, pattern: SkipPattern) -> Self {
        self.patterns.push(pattern);
        self
    }

    pub fn with_patterns(mut self, patterns: impl IntoIterator<Item = SkipPattern>) -> Self {
        self.patterns.extend(patterns);
        self
    }

    pub fn patterns(&self) -> &[SkipPattern] {
        &self.patterns
    }

    pub fn matches(&self, error: &ApiError) -> bool {
        self.patterns.iter().any(|p| p.matches(error))
    }
}

/// One page of a paginated list call.
#[derive(Debug, Clone, PartialEq)]
pub struct Page<T> {
    pub items: Vec<T>,
    /// Token of the next page. `None` (or an empty token) on the last page.
    pub next_token: Option<String>,
}

impl<T> Page<T> {
    pub fn new(items: Vec<T>, next_token: Option<String>) -> Self {
        Page { items, next_token }
    }

    pub fn last(items: Vec<T>) -> Self {
        Page {
            items,
            next_token: None,
        }
    }
}

/// Lazily walks a paginated list call, yielding the items of one page at a
/// time.
///
/// `fetch` receives the token of the page to fetch (`None` for the first).
/// Every call is bounded by the context's cancellation and timeout. The
/// stream ends after the last page, or after yielding the first error.
pub fn pages<'a, C, T, F, Fut>(
    ctx: &'a SweepContext<C>,
    mut fetch: F,
) -> impl Stream<Item = Result<Vec<T>, ApiError>> + 'a
where
    F: FnMut(Option<String>) -> Fut + 'a,
    Fut: Future<Output = Result<Page<T>, ApiError>> + 'a,
    T: 'a,
{
    // `None` means there are no more pages to fetch
    let first: Option<Option<String>> = Some(None);
    futures::stream::try_unfold(first, move |state| {
        let next = state.map(&mut fetch);
        async move {
            let Some(call) = next else {
                return Ok(None);
            };
            let page = ctx.call(call).await?;
            let state = page.next_token.filter(|token| !token.is_empty()).map(Some);
            Ok(Some((page.items, state)))
        }
    })
}
