//! Optional caller-supplied hooks run around each outbound call.
//!
//! A hook returning an error aborts the call with `BillingError::Hook`.

use crate::billing::mapper::RawResponse;

pub type HookError = Box<dyn std::error::Error + Send + Sync>;

/// Runs after the request is built and before it is sent. May mutate it.
pub trait RequestHook: Send + Sync {
    fn before_request(&self, request: &mut reqwest::Request) -> Result<(), HookError>;
}

/// Runs after the response body is read and before it is mapped.
pub trait ResponseHook: Send + Sync {
    fn after_response(&self, response: &RawResponse) -> Result<(), HookError>;
}

impl<F> RequestHook for F
where
    F: Fn(&mut reqwest::Request) -> Result<(), HookError> + Send + Sync,
{
    fn before_request(&self, request: &mut reqwest::Request) -> Result<(), HookError> {
        self(request)
    }
}

impl<F> ResponseHook for F
where
    F: Fn(&RawResponse) -> Result<(), HookError> + Send + Sync,
{
    fn after_response(&self, response: &RawResponse) -> Result<(), HookError> {
        self(response)
    }
}
