//! Conversions from external infrastructure errors into domain errors.

use std::time::Duration;

use console_domain::TransportError;
use reqwest::Error as HttpError;

/// Maps an adapter-side failure onto the transport error the resilient
/// layer understands.
///
/// `timeout` is the per-attempt limit the client was built with; reqwest
/// does not report it back.
pub(crate) trait IntoTransportError {
    fn into_transport(self, timeout: Duration) -> TransportError;
}

/* -------------------------------------------------------------------------- */
/* reqwest::Error → TransportError */
/* -------------------------------------------------------------------------- */

impl IntoTransportError for HttpError {
    fn into_transport(self, timeout: Duration) -> TransportError {
        if self.is_timeout() {
            return TransportError::Timeout(timeout);
        }

        if self.is_builder() {
            return TransportError::InvalidRequest(self.to_string());
        }

        #[cfg(not(target_arch = "wasm32"))]
        if self.is_connect() {
            return TransportError::ConnectionFailed(format!("connection failure: {self}"));
        }

        // Request/body errors mean the exchange broke mid-flight.
        TransportError::ConnectionFailed(self.to_string())
    }
}

/* -------------------------------------------------------------------------- */
/* Tests */
/* -------------------------------------------------------------------------- */
