use std::fmt;

use crate::request::Caller;

/// Request-scoped logger.
///
/// Every event carries the caller's `request_id` and `user_id` as
/// structured fields. Obtained from [`RequestLog::for_caller`]; it borrows
/// the caller so it cannot outlive the request.
///
/// Secret values are redacted when logged because of their `Debug` and
/// `Display` implementations.
#[derive(Debug, Clone, Copy)]
pub struct RequestLog<'a> {
    caller: &'a Caller,
}

impl<'a> RequestLog<'a> {
    /// Creates a logger bound to `caller`.
    pub fn for_caller(caller: &'a Caller) -> Self {
        Self { caller }
    }

    /// Returns the request ID associated with this logger.
    pub fn request_id(&self) -> &str {
        self.caller.request_id()
    }

    /// Logs an info-level message.
    ///
    /// ```no_run
    /// # use conduit_policy::{Caller, RequestLog};
    /// let caller = Caller::new("req-1", 7);
    /// let log = RequestLog::for_caller(&caller);
    /// log.info(format_args!("created conduit {}", 12));
    /// ```
    pub fn info(&self, args: fmt::Arguments<'_>) {
        tracing::info!(
            request_id = %self.caller.request_id(),
            user_id = self.caller.user_id(),
            "{}",
            args
        );
    }

    /// Logs a warning-level message.
    pub fn warn(&self, args: fmt::Arguments<'_>) {
        tracing::warn!(
            request_id = %self.caller.request_id(),
            user_id = self.caller.user_id(),
            "{}",
            args
        );
    }

    /// Logs an error-level message.
    pub fn error(&self, args: fmt::Arguments<'_>) {
        tracing::error!(
            request_id = %self.caller.request_id(),
            user_id = self.caller.user_id(),
            "{}",
            args
        );
    }

    /// Logs a debug-level message.
    pub fn debug(&self, args: fmt::Arguments<'_>) {
        tracing::debug!(
            request_id = %self.caller.request_id(),
            user_id = self.caller.user_id(),
            "{}",
            args
        );
    }
}
