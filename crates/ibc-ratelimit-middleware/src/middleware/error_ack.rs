//! Error acknowledgements with an accompanying diagnostic event.

use ibc_ratelimit_core::error::RateLimitError;
use ibc_ratelimit_core::protocol::Acknowledgement;

use crate::obs::events::{ATTR_ERROR, ATTR_ERROR_CONTEXT, EVENT_ACK_ERROR};
use crate::obs::{Event, EventSink};

/// Build an error acknowledgement for `err`.
///
/// With an error, emits one `acknowledgement-error` event carrying the error
/// message and one `error-context` attribute per context string, in order.
/// Without one, emits nothing and returns a generic error ack.
pub fn new_error_acknowledgement(
    events: &dyn EventSink,
    err: Option<&RateLimitError>,
    contexts: &[&str],
) -> Acknowledgement {
    let Some(err) = err else {
        return Acknowledgement::Error("ABCI code: 0: error handling packet".to_string());
    };

    let mut event = Event::new(EVENT_ACK_ERROR).attr(ATTR_ERROR, err.to_string());
    for ctx in contexts {
        tracing::info!(code = err.code().as_str(), context = %ctx, "acknowledgement error context");
        event = event.attr(ATTR_ERROR_CONTEXT, *ctx);
    }
    events.emit(event);

    Acknowledgement::Error(format!(
        "ABCI code: {}: error handling packet: {err}",
        err.code().abci_code()
    ))
}
