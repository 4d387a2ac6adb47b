use commons::CustomContractError;
use concordium_std::*;

use crate::external::{AuctionView, InitParams};

/// Index of the block that contains `slot_time`, or `None` for a zero block
/// time.
pub fn block_index(slot_time: Timestamp, block_time: Duration) -> Option<u64> {
    slot_time
        .timestamp_millis()
        .checked_div(block_time.millis())
}

/// Superseded or winning bid. On overbid it must be refunded, on settlement
/// it must be transferred to the seller.
#[must_use]
#[derive(Debug, PartialEq, Eq)]
pub struct LastBid {
    pub account: AccountAddress,
    pub amount: Amount,
}

/// Auction outcome.
#[must_use]
#[derive(Debug, PartialEq, Eq)]
pub enum AuctionResult {
    /// Highest bid goes to the seller.
    Winner {
        seller: AccountAddress,
        winning_bid: LastBid,
    },
    /// No bids were placed during the auction
    NoBids(AccountAddress),
}

/// The contract state.
#[derive(Debug, Clone, Serialize, SchemaType, PartialEq, Eq)]
pub struct State {
    /// Seller account address.
    seller: AccountAddress,
    /// Floor of the asking price.
    reserve_price: Amount,
    /// Number of blocks the auction accepts bids for.
    num_blocks_open: u64,
    /// Price drop per elapsed block.
    price_decrement: Amount,
    /// Asking price at the start block.
    initial_price: Amount,
    /// Length of a single block.
    block_time: Duration,
    /// Block the auction was created in.
    start_block: u64,
    /// First block in which bids are no longer accepted.
    end_block: u64,
    /// Current highest bid, zero while there are no bids.
    highest_bid: Amount,
    /// Current highest bidder.
    highest_bidder: Option<AccountAddress>,
    /// Set once the auction has been settled.
    ended: bool,
}

impl State {
    /// Create a new auction opened in `current_block`.
    pub fn new(
        seller: AccountAddress,
        params: InitParams,
        current_block: u64,
    ) -> Result<Self, CustomContractError> {
        ensure!(
            params.num_blocks_open > 0 && params.block_time.millis() > 0,
            CustomContractError::InvalidParameters
        );

        let initial_price = params
            .price_decrement
            .micro_ccd
            .checked_mul(params.num_blocks_open)
            .and_then(|total_drop| total_drop.checked_add(params.reserve_price.micro_ccd))
            .map(Amount::from_micro_ccd)
            .ok_or(CustomContractError::InvalidParameters)?;
        let end_block = current_block
            .checked_add(params.num_blocks_open)
            .ok_or(CustomContractError::InvalidParameters)?;

        Ok(Self {
            seller,
            reserve_price: params.reserve_price,
            num_blocks_open: params.num_blocks_open,
            price_decrement: params.price_decrement,
            initial_price,
            block_time: params.block_time,
            start_block: current_block,
            end_block,
            highest_bid: Amount::zero(),
            highest_bidder: None,
            ended: false,
        })
    }

    /// Block index of the given slot time.
    pub fn block_at(&self, slot_time: Timestamp) -> u64 {
        // Block time is non-zero, checked in `new`.
        slot_time.timestamp_millis() / self.block_time.millis()
    }

    /// Asking price at `current_block`.
    pub fn current_price(&self, current_block: u64) -> Amount {
        let elapsed = current_block
            .saturating_sub(self.start_block)
            .min(self.num_blocks_open);
        // Can't overflow or go below the reserve: the full drop over
        // `num_blocks_open` blocks was checked in `new`.
        let price = self.initial_price.micro_ccd - self.price_decrement.micro_ccd * elapsed;
        Amount::from_micro_ccd(price).max(self.reserve_price)
    }

    pub fn bid(
        &mut self,
        bidder: AccountAddress,
        amount: Amount,
        current_block: u64,
    ) -> Result<Option<LastBid>, CustomContractError> {
        ensure!(
            !self.ended && current_block < self.end_block,
            CustomContractError::AuctionEnded
        );
        ensure!(amount > self.highest_bid, CustomContractError::BidTooLow);

        // Update the highest bid after all checks, return the previous bid that MUST be refunded
        let previous_amount = self.highest_bid;
        self.highest_bid = amount;
        Ok(self
            .highest_bidder
            .replace(bidder)
            .map(|account| LastBid {
                account,
                amount: previous_amount,
            }))
    }

    /// Close the auction. Anyone may do so once the end block is reached.
    pub fn end(&mut self, current_block: u64) -> Result<AuctionResult, CustomContractError> {
        ensure!(!self.ended, CustomContractError::AuctionAlreadyEnded);
        ensure!(
            current_block >= self.end_block,
            CustomContractError::AuctionNotYetEndable
        );

        self.ended = true;

        let result = self
            .highest_bidder
            .map(|account| AuctionResult::Winner {
                seller: self.seller,
                winning_bid: LastBid {
                    account,
                    amount: self.highest_bid,
                },
            })
            .unwrap_or(AuctionResult::NoBids(self.seller));
        Ok(result)
    }

    pub fn seller(&self) -> AccountAddress {
        self.seller
    }

    pub fn initial_price(&self) -> Amount {
        self.initial_price
    }

    pub fn start_block(&self) -> u64 {
        self.start_block
    }

    pub fn end_block(&self) -> u64 {
        self.end_block
    }

    /// Snapshot of the auction as seen in `current_block`.
    pub fn view(&self, current_block: u64) -> AuctionView {
        AuctionView {
            seller: self.seller,
            reserve_price: self.reserve_price,
            num_blocks_open: self.num_blocks_open,
            price_decrement: self.price_decrement,
            initial_price: self.initial_price,
            block_time: self.block_time,
            start_block: self.start_block,
            end_block: self.end_block,
            current_block,
            current_price: self.current_price(current_block),
            highest_bid: self.highest_bid,
            highest_bidder: self.highest_bidder,
            ended: self.ended,
        }
    }
}

#[concordium_cfg_test]
mod tests {
    use super::*;

    const SELLER: AccountAddress = AccountAddress([0u8; 32]);
    const BIDDER_1: AccountAddress = AccountAddress([1u8; 32]);
    const BIDDER_2: AccountAddress = AccountAddress([2u8; 32]);

    const START: u64 = 5;

    fn ccd_tenths(tenths: u64) -> Amount {
        Amount::from_micro_ccd(tenths * 100_000)
    }

    fn params() -> InitParams {
        InitParams {
            reserve_price: ccd_tenths(10),
            num_blocks_open: 10,
            price_decrement: ccd_tenths(1),
            block_time: Duration::from_seconds(1),
        }
    }

    fn new_auction() -> State {
        State::new(SELLER, params(), START).expect_report("Valid parameters are rejected")
    }

    #[concordium_test]
    fn test_new() {
        let auction = new_auction();

        claim_eq!(auction.seller(), SELLER);
        claim_eq!(auction.initial_price(), ccd_tenths(20));
        claim_eq!(auction.start_block(), START);
        claim_eq!(auction.end_block(), START + 10);
        claim_eq!(auction.highest_bid, Amount::zero());
        claim_eq!(auction.highest_bidder, None);
        claim!(!auction.ended);
    }

    #[concordium_test]
    fn test_new_invalid_parameters() {
        let mut zero_blocks = params();
        zero_blocks.num_blocks_open = 0;
        claim_eq!(
            State::new(SELLER, zero_blocks, START),
            Err(CustomContractError::InvalidParameters)
        );

        let mut zero_block_time = params();
        zero_block_time.block_time = Duration::from_millis(0);
        claim_eq!(
            State::new(SELLER, zero_block_time, START),
            Err(CustomContractError::InvalidParameters)
        );

        let mut price_overflow = params();
        price_overflow.price_decrement = Amount::from_micro_ccd(u64::MAX / 2);
        claim_eq!(
            State::new(SELLER, price_overflow, START),
            Err(CustomContractError::InvalidParameters)
        );

        claim_eq!(
            State::new(SELLER, params(), u64::MAX - 1),
            Err(CustomContractError::InvalidParameters)
        );
    }

    #[concordium_test]
    fn test_zero_decrement_is_flat() {
        let mut flat = params();
        flat.price_decrement = Amount::zero();
        let auction = State::new(SELLER, flat, START).expect_report("Flat auction is rejected");

        claim_eq!(auction.initial_price(), ccd_tenths(10));
        for block in START..START + 20 {
            claim_eq!(auction.current_price(block), ccd_tenths(10));
        }
    }

    #[concordium_test]
    fn test_current_price_decays_to_reserve() {
        let auction = new_auction();

        claim_eq!(auction.current_price(START), auction.initial_price());
        claim_eq!(auction.current_price(START + 1), ccd_tenths(19));
        claim_eq!(auction.current_price(START + 5), ccd_tenths(15));
        claim_eq!(auction.current_price(START + 10), ccd_tenths(10));
        claim_eq!(auction.current_price(START + 1_000), ccd_tenths(10));
        // Blocks before the start are priced as the start block.
        claim_eq!(auction.current_price(0), auction.initial_price());

        let mut previous = auction.current_price(START);
        for block in START..START + 30 {
            let price = auction.current_price(block);
            claim!(price <= previous, "Price went up at block {}", block);
            claim!(price >= ccd_tenths(10), "Price below reserve at block {}", block);
            previous = price;
        }
    }

    #[concordium_test]
    fn test_bid_and_refund() {
        let mut auction = new_auction();

        let refund = auction.bid(BIDDER_1, ccd_tenths(15), START + 1);
        claim_eq!(refund, Ok(None));
        claim_eq!(auction.highest_bid, ccd_tenths(15));
        claim_eq!(auction.highest_bidder, Some(BIDDER_1));

        let refund = auction.bid(BIDDER_2, ccd_tenths(20), START + 2);
        claim_eq!(
            refund,
            Ok(Some(LastBid {
                account: BIDDER_1,
                amount: ccd_tenths(15),
            }))
        );
        claim_eq!(auction.highest_bid, ccd_tenths(20));
        claim_eq!(auction.highest_bidder, Some(BIDDER_2));

        // Outbidding yourself refunds your own previous bid.
        let refund = auction.bid(BIDDER_2, ccd_tenths(21), START + 3);
        claim_eq!(
            refund,
            Ok(Some(LastBid {
                account: BIDDER_2,
                amount: ccd_tenths(20),
            }))
        );
    }

    #[concordium_test]
    fn test_bid_too_low() {
        let mut auction = new_auction();

        claim_eq!(
            auction.bid(BIDDER_1, Amount::zero(), START),
            Err(CustomContractError::BidTooLow)
        );
        claim_eq!(auction.highest_bidder, None);

        let _ = auction.bid(BIDDER_1, ccd_tenths(15), START);
        claim_eq!(
            auction.bid(BIDDER_2, ccd_tenths(15), START),
            Err(CustomContractError::BidTooLow)
        );
        claim_eq!(
            auction.bid(BIDDER_2, ccd_tenths(14), START),
            Err(CustomContractError::BidTooLow)
        );
        claim_eq!(auction.highest_bid, ccd_tenths(15));
        claim_eq!(auction.highest_bidder, Some(BIDDER_1));
    }

    #[concordium_test]
    fn test_bid_below_current_price_is_accepted() {
        let mut auction = new_auction();

        // Only the highest bid is checked, not the decayed price.
        claim_eq!(auction.bid(BIDDER_1, ccd_tenths(1), START), Ok(None));
        claim_eq!(auction.highest_bid, ccd_tenths(1));
    }

    #[concordium_test]
    fn test_bid_after_end_block() {
        let mut auction = new_auction();

        claim_eq!(auction.bid(BIDDER_1, ccd_tenths(15), START + 9), Ok(None));
        claim_eq!(
            auction.bid(BIDDER_2, ccd_tenths(20), START + 10),
            Err(CustomContractError::AuctionEnded)
        );
        claim_eq!(auction.highest_bidder, Some(BIDDER_1));
    }

    #[concordium_test]
    fn test_end_with_winner() {
        let mut auction = new_auction();
        let _ = auction.bid(BIDDER_1, ccd_tenths(20), START);

        claim_eq!(
            auction.end(START + 9),
            Err(CustomContractError::AuctionNotYetEndable)
        );
        claim!(!auction.ended);

        claim_eq!(
            auction.end(START + 10),
            Ok(AuctionResult::Winner {
                seller: SELLER,
                winning_bid: LastBid {
                    account: BIDDER_1,
                    amount: ccd_tenths(20),
                },
            })
        );
        claim!(auction.ended);
    }

    #[concordium_test]
    fn test_end_without_bids() {
        let mut auction = new_auction();

        claim_eq!(auction.end(START + 15), Ok(AuctionResult::NoBids(SELLER)));
        claim!(auction.ended);
    }

    #[concordium_test]
    fn test_ended_is_terminal() {
        let mut auction = new_auction();
        let _ = auction.bid(BIDDER_1, ccd_tenths(15), START);
        let _ = auction.end(START + 10);
        let before = auction.clone();

        claim_eq!(
            auction.end(START + 11),
            Err(CustomContractError::AuctionAlreadyEnded)
        );
        claim_eq!(
            auction.bid(BIDDER_2, ccd_tenths(30), START + 11),
            Err(CustomContractError::AuctionEnded)
        );
        // Even a block that would still be open before the end block.
        claim_eq!(
            auction.bid(BIDDER_2, ccd_tenths(30), START),
            Err(CustomContractError::AuctionEnded)
        );
        claim_eq!(auction, before);
    }

    #[concordium_test]
    fn test_block_index() {
        let second = Duration::from_seconds(1);

        claim_eq!(block_index(Timestamp::from_timestamp_millis(0), second), Some(0));
        claim_eq!(block_index(Timestamp::from_timestamp_millis(999), second), Some(0));
        claim_eq!(block_index(Timestamp::from_timestamp_millis(1_000), second), Some(1));
        claim_eq!(
            block_index(Timestamp::from_timestamp_millis(1_000), Duration::from_millis(0)),
            None
        );

        let auction = new_auction();
        claim_eq!(auction.block_at(Timestamp::from_timestamp_millis(12_345)), 12);
    }
}
