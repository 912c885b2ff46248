/*!
 * Mock backend for testing.
 *
 * Simulates different provider behaviors without network access:
 * - `MockBackend::uppercase_reverse()` - Reverses and uppercases the text
 * - `MockBackend::echo()` - Returns the text unchanged
 * - `MockBackend::fail_on_call(n)` - Fails on the n-th call only
 * - `MockBackend::failing()` - Always fails with an error
 */

use async_trait::async_trait;
use parking_lot::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use super::TranslationBackend;
use crate::errors::ProviderError;

/// Behavior mode for the mock backend
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MockBehavior {
    /// Reverse the characters, then uppercase them
    UppercaseReverse,
    /// Return the input unchanged
    Echo,
    /// Fail on the given 1-based call, uppercase-reverse otherwise
    FailOnCall(usize),
    /// Always fail with a connection error
    Failing,
}

/// Mock backend recording every call
#[derive(Debug)]
pub struct MockBackend {
    /// Behavior mode
    behavior: MockBehavior,
    /// Number of translate calls
    calls: AtomicUsize,
    /// Texts received, in call order
    received: Mutex<Vec<String>>,
}

impl MockBackend {
    /// Create a new mock backend with the specified behavior
    pub fn new(behavior: MockBehavior) -> Self {
        Self {
            behavior,
            calls: AtomicUsize::new(0),
            received: Mutex::new(Vec::new()),
        }
    }

    pub fn uppercase_reverse() -> Self {
        Self::new(MockBehavior::UppercaseReverse)
    }

    pub fn echo() -> Self {
        Self::new(MockBehavior::Echo)
    }

    pub fn fail_on_call(call: usize) -> Self {
        Self::new(MockBehavior::FailOnCall(call))
    }

    pub fn failing() -> Self {
        Self::new(MockBehavior::Failing)
    }

    /// Number of translate calls made so far
    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Texts received so far, in call order
    pub fn received_texts(&self) -> Vec<String> {
        self.received.lock().clone()
    }

    /// The transformation applied by `UppercaseReverse`
    pub fn uppercase_reversed(text: &str) -> String {
        text.chars().rev().collect::<String>().to_uppercase()
    }
}

#[async_trait]
impl TranslationBackend for MockBackend {
    fn name(&self) -> &str {
        "mock"
    }

    async fn translate(
        &self,
        text: &str,
        _source_language: &str,
        _target_language: &str,
    ) -> Result<String, ProviderError> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
        self.received.lock().push(text.to_string());

        match self.behavior {
            MockBehavior::Echo => Ok(text.to_string()),
            MockBehavior::UppercaseReverse => Ok(Self::uppercase_reversed(text)),
            MockBehavior::FailOnCall(failing_call) if failing_call == call => Err(ProviderError::RequestFailed(
                format!("mock failure on call {}", call),
            )),
            MockBehavior::FailOnCall(_) => Ok(Self::uppercase_reversed(text)),
            MockBehavior::Failing => Err(ProviderError::ConnectionError("mock backend unreachable".to_string())),
        }
    }
}
