use thiserror::Error;

/// Failures inside the bridge itself.
///
/// Handlers never see these. The entry point logs them and answers the host
/// with [`ReturnCode::BRIDGE_FAILURE`](crate::ReturnCode::BRIDGE_FAILURE).
#[derive(Debug, Error)]
pub enum BridgeError {
    #[error("host does not export `{symbol}`")]
    MissingSymbol {
        symbol: &'static str,
        #[source]
        source: libloading::Error,
    },

    #[error("cannot open the running process image")]
    ProcessImage(#[source] libloading::Error),

    #[error("host passed a null servlet handle")]
    NullHandle,

    #[error("servlet handler `{handler}` panicked: {message}")]
    HandlerPanicked { handler: String, message: String },
}
