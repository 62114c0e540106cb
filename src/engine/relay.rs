use std::fmt;

/// One frame of the live progress stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RelayMessage {
    Text(String),
    Binary(Vec<u8>),
}

/// Which side ended a relay.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClosedBy {
    Upstream,
    Downstream,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelayOutcome {
    pub forwarded: usize,
    pub closed_by: ClosedBy,
}

/// Forwards messages from `upstream` to `downstream` unchanged and in arrival order.
///
/// The relay ends when the upstream runs out or fails, or when the downstream refuses a
/// message. The message in hand when the downstream refuses it is dropped; dropping both
/// ends on return closes the other side.
pub fn relay<U, E, D, F>(upstream: U, mut downstream: D) -> RelayOutcome
where
    U: IntoIterator<Item = Result<RelayMessage, E>>,
    E: fmt::Display,
    D: FnMut(RelayMessage) -> Result<(), F>,
    F: fmt::Display,
{
    let mut forwarded = 0;
    for message in upstream {
        let message = match message {
            Ok(message) => message,
            Err(e) => {
                tracing::warn!(error = %e, forwarded, "upstream live stream failed");
                return RelayOutcome {
                    forwarded,
                    closed_by: ClosedBy::Upstream,
                };
            }
        };
        if let Err(e) = downstream(message) {
            tracing::info!(reason = %e, forwarded, "downstream disconnected from live stream");
            return RelayOutcome {
                forwarded,
                closed_by: ClosedBy::Downstream,
            };
        }
        forwarded += 1;
    }

    tracing::debug!(forwarded, "upstream live stream ended");
    RelayOutcome {
        forwarded,
        closed_by: ClosedBy::Upstream,
    }
}
