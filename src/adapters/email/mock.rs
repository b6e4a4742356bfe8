//! Recording email sender for tests.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;

use crate::ports::{EmailError, WelcomeEmail, WelcomeEmailSender};

/// Keeps every message it is asked to send; can be told to fail.
#[derive(Clone, Default)]
pub struct RecordingEmailSender {
    inner: Arc<Mutex<RecorderState>>,
}

#[derive(Default)]
struct RecorderState {
    sent: Vec<WelcomeEmail>,
    fail_with: Option<EmailError>,
}

impl RecordingEmailSender {
    pub fn new() -> Self {
        Self::default()
    }

    /// A sender whose every send fails.
    pub fn failing(error: EmailError) -> Self {
        let sender = Self::new();
        sender.state().fail_with = Some(error);
        sender
    }

    fn state(&self) -> MutexGuard<'_, RecorderState> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn sent(&self) -> Vec<WelcomeEmail> {
        self.state().sent.clone()
    }
}

#[async_trait]
impl WelcomeEmailSender for RecordingEmailSender {
    async fn send_welcome(&self, email: &WelcomeEmail) -> Result<(), EmailError> {
        let mut state = self.state();
        if let Some(err) = state.fail_with.clone() {
            return Err(err);
        }
        state.sent.push(email.clone());
        Ok(())
    }
}
