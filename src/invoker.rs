//! Boundary to the external inpainting service.
//!
//! The mask pipeline never calls this itself: callers take a
//! [`MaskOutput`](crate::MaskOutput), turn it into an [`EditRequest`], and hand
//! it to whichever [`EditInvoker`] they use. Latency, retries and timeouts are
//! the caller's concern.

use std::ops::RangeInclusive;

use crate::error::{Error, Result};

/// Inference steps used when the caller does not choose.
pub const DEFAULT_STEPS: u32 = 35;

/// Accepted inference step counts.
pub const STEP_RANGE: RangeInclusive<u32> = 10..=50;

/// Text instruction and sampling controls for one edit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EditParams {
    /// What the model should do inside the mask.
    pub instruction: String,
    steps: u32,
    /// Fixed seed for reproducible output.
    pub seed: Option<u64>,
}

impl EditParams {
    /// Params with the default step count and no seed.
    pub fn new(instruction: impl Into<String>) -> Self {
        Self {
            instruction: instruction.into(),
            steps: DEFAULT_STEPS,
            seed: None,
        }
    }

    /// Override the step count.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidSteps`] if `steps` is outside [`STEP_RANGE`].
    pub fn with_steps(mut self, steps: u32) -> Result<Self> {
        if !STEP_RANGE.contains(&steps) {
            return Err(Error::InvalidSteps(steps));
        }
        self.steps = steps;
        Ok(self)
    }

    /// Fix the sampling seed.
    #[must_use]
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Inference step count, always within [`STEP_RANGE`].
    #[must_use]
    pub fn steps(&self) -> u32 {
        self.steps
    }
}

/// Everything the inpainting service receives.
#[derive(Debug, Clone)]
pub struct EditRequest {
    /// PNG-encoded RGB guide image.
    pub guide_image: Vec<u8>,
    /// PNG-encoded single-channel soft mask.
    pub soft_mask: Vec<u8>,
    /// Instruction and sampling controls.
    pub params: EditParams,
}

/// Where the edited image can be found.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EditOutcome {
    /// A URL to fetch the result from.
    Url(String),
    /// The encoded result itself.
    Bytes(Vec<u8>),
}

/// A (possibly slow, possibly failing) inpainting backend.
pub trait EditInvoker {
    /// Submit one edit and wait for its result.
    ///
    /// # Errors
    ///
    /// Implementations return [`Error::Invoke`] (or a transport error) when
    /// the service fails or answers with something unusable.
    fn invoke(&self, request: &EditRequest) -> Result<EditOutcome>;
}

#[cfg(feature = "remote")]
pub use http::HttpEditInvoker;

#[cfg(feature = "remote")]
mod http {
    use std::time::Duration;

    use base64::engine::general_purpose::STANDARD as BASE64;
    use base64::Engine as _;
    use reqwest::blocking::Client;
    use reqwest::header::CONTENT_TYPE;
    use serde_json::{json, Value};

    use super::{EditInvoker, EditOutcome, EditRequest};
    use crate::error::{Error, Result};

    /// JSON-over-HTTP client for a hosted inpainting model.
    ///
    /// Posts `{"input": {image, mask, prompt, num_inference_steps, seed}}`
    /// with images as PNG data URLs, and reads the result from `output`
    /// (a string or the first string of an array).
    #[derive(Debug, Clone)]
    pub struct HttpEditInvoker {
        client: Client,
        endpoint: String,
        token: Option<String>,
    }

    impl HttpEditInvoker {
        /// Client for `endpoint` with a per-request `timeout`.
        ///
        /// # Errors
        ///
        /// Returns [`Error::Http`] if the HTTP client cannot be built.
        pub fn new(endpoint: impl Into<String>, timeout: Duration) -> Result<Self> {
            let client = Client::builder().timeout(timeout).build()?;
            Ok(Self {
                client,
                endpoint: endpoint.into(),
                token: None,
            })
        }

        /// Authenticate with a bearer token.
        #[must_use]
        pub fn with_token(mut self, token: impl Into<String>) -> Self {
            self.token = Some(token.into());
            self
        }
    }

    fn png_data_url(bytes: &[u8]) -> String {
        format!("data:image/png;base64,{}", BASE64.encode(bytes))
    }

    pub(super) fn payload(request: &EditRequest) -> Value {
        let mut input = json!({
            "image": png_data_url(&request.guide_image),
            "mask": png_data_url(&request.soft_mask),
            "prompt": request.params.instruction,
            "num_inference_steps": request.params.steps(),
        });
        if let Some(seed) = request.params.seed {
            input["seed"] = json!(seed);
        }
        json!({ "input": input })
    }

    pub(super) fn parse_outcome(response: &Value) -> Result<EditOutcome> {
        let output = match &response["output"] {
            Value::String(s) => s.as_str(),
            Value::Array(items) => items
                .iter()
                .find_map(Value::as_str)
                .ok_or_else(|| Error::Invoke("output array holds no string".to_string()))?,
            Value::Null => {
                let detail = response["error"].as_str().unwrap_or("response has no output");
                return Err(Error::Invoke(detail.to_string()));
            }
            other => return Err(Error::Invoke(format!("unexpected output: {other}"))),
        };

        if let Some(encoded) = output
            .strip_prefix("data:")
            .and_then(|rest| rest.split_once(";base64,"))
            .map(|(_, data)| data)
        {
            let bytes = BASE64
                .decode(encoded)
                .map_err(|e| Error::Invoke(format!("invalid base64 output: {e}")))?;
            return Ok(EditOutcome::Bytes(bytes));
        }

        Ok(EditOutcome::Url(output.to_string()))
    }

    impl EditInvoker for HttpEditInvoker {
        fn invoke(&self, request: &EditRequest) -> Result<EditOutcome> {
            log::debug!(
                "invoking edit at {} ({} steps, seed {:?})",
                self.endpoint,
                request.params.steps(),
                request.params.seed
            );

            let mut builder = self
                .client
                .post(&self.endpoint)
                .header(CONTENT_TYPE, "application/json")
                .json(&payload(request));
            if let Some(token) = &self.token {
                builder = builder.bearer_auth(token);
            }

            let response = builder.send()?;
            let status = response.status();
            if !status.is_success() {
                let body = response.text().unwrap_or_default();
                return Err(Error::Invoke(format!("service returned {status}: {body}")));
            }

            let parsed: Value = response.json()?;
            parse_outcome(&parsed)
        }
    }
}
