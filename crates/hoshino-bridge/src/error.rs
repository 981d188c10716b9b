use thiserror::Error;

/// The only failures that escape the bridge.
///
/// Everything below this level (channel errors, parse errors, correlation
/// misses) is absorbed into boolean/optional outcomes. The two variants are
/// deliberately distinct: after `DeliveryFailed` the caller may retry the
/// send, after `NoReplyObserved` the message already reached the device and
/// a resend would duplicate it.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum BridgeError {
    /// Injection did not complete; the message never reached the input field.
    #[error("failed to deliver message to the device")]
    DeliveryFailed,

    /// The message was sent but no reply was found before the deadline.
    #[error("no reply observed before the deadline")]
    NoReplyObserved,
}
