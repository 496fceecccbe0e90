//! Panic recovery for the request pipeline.
//!
//! Recovery is the outermost wrapper around chain execution and proxying,
//! so every downstream stage can rely on it. A panic anywhere inside the
//! wrapped future becomes a `System` error and flows through the normal
//! Problem Details path.

use std::panic::AssertUnwindSafe;

use futures_util::FutureExt;

use crate::error::GatewayError;

#[derive(Debug, Clone, Default)]
pub struct Recovery {
    log_stack: bool,
}

impl Recovery {
    pub fn new(log_stack: bool) -> Self {
        Self { log_stack }
    }

    /// Run `fut`, converting a panic into a `System` error.
    pub async fn run<T>(
        &self,
        request_id: Option<&str>,
        fut: impl std::future::Future<Output = Result<T, GatewayError>>,
    ) -> Result<T, GatewayError> {
        match AssertUnwindSafe(fut).catch_unwind().await {
            Ok(result) => result,
            Err(panic) => {
                let payload = panic_message(&panic);
                if self.log_stack {
                    tracing::error!(
                        request_id = request_id.unwrap_or_default(),
                        panic = %payload,
                        stack = %std::backtrace::Backtrace::force_capture(),
                        "panic recovered"
                    );
                } else {
                    tracing::error!(
                        request_id = request_id.unwrap_or_default(),
                        panic = %payload,
                        "panic recovered"
                    );
                }
                Err(GatewayError::system(
                    "An unexpected error occurred",
                    format!("panic recovered: {payload}"),
                ))
            }
        }
    }
}

fn panic_message(panic: &Box<dyn std::any::Any + Send>) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic payload".to_string()
    }
}
