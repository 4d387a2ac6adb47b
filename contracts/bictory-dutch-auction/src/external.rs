use concordium_std::*;

#[derive(Debug, Clone, Serialize, SchemaType)]
pub struct InitParams {
    /// Smallest price the item sells for.
    pub reserve_price: Amount,
    /// Number of blocks the auction accepts bids for.
    pub num_blocks_open: u64,
    /// Price drop per elapsed block.
    pub price_decrement: Amount,
    /// Length of a single block. Block indices are derived from the slot time.
    pub block_time: Duration,
}

/// The part of the state to be viewed using `concordium-client contract invoke`
#[derive(Debug, Clone, Serialize, SchemaType, PartialEq, Eq)]
pub struct AuctionView {
    pub seller: AccountAddress,
    pub reserve_price: Amount,
    pub num_blocks_open: u64,
    pub price_decrement: Amount,
    pub initial_price: Amount,
    pub block_time: Duration,
    pub start_block: u64,
    pub end_block: u64,
    /// Block index at the time of the query.
    pub current_block: u64,
    /// Asking price at the time of the query.
    pub current_price: Amount,
    pub highest_bid: Amount,
    pub highest_bidder: Option<AccountAddress>,
    pub ended: bool,
}
