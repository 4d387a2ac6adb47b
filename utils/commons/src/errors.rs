use super::*;

/// The custom errors the contract can produce.
#[derive(Serialize, Debug, PartialEq, Eq, Reject)]
pub enum CustomContractError {
    /// Failed parsing the parameter (Error code: -1).
    #[from(ParseError)]
    ParseParams,
    /// Failed logging: Log is full (Error code: -2).
    LogFull,
    /// Failed logging: Log is malformed (Error code: -3).
    LogMalformed,
    /// Only account addresses can bid (Error code: -4).
    OnlyAccountAddress,
    /// Zero blocks open, zero block time or a price that overflows
    /// (Error code: -5).
    InvalidParameters,
    // Raised if bid is placed after the last open block or after the auction
    // has been ended (Error code: -6)
    AuctionEnded,
    // Raised if bid is not strictly higher than the highest bid
    // (Error code: -7)
    BidTooLow,
    // Raised if there is an attempt to end the auction before its end block
    // (Error code: -8)
    AuctionNotYetEndable,
    // Raised if the auction has already been ended (Error code: -9)
    AuctionAlreadyEnded,
    // Raised if a refund or the seller payout could not be delivered
    // (Error code: -10)
    TransferFailed,
}

/// Mapping the logging errors to CustomContractError.
impl From<LogError> for CustomContractError {
    fn from(le: LogError) -> Self {
        match le {
            LogError::Full => Self::LogFull,
            LogError::Malformed => Self::LogMalformed,
        }
    }
}

/// Mapping the transfer errors to CustomContractError.
impl From<TransferError> for CustomContractError {
    fn from(_: TransferError) -> Self {
        Self::TransferFailed
    }
}
