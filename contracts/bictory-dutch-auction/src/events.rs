use commons::{BIDING_TAG, FINALIZE_TAG, INIT_TAG, REFUND_TAG};
use concordium_std::*;

/// Auction creation event data.
#[derive(Debug, Serial)]
pub struct InitEvent {
    /// Seller account address.
    pub seller: AccountAddress,
    /// Floor of the asking price.
    pub reserve_price: Amount,
    /// Asking price at the start block.
    pub initial_price: Amount,
    pub start_block: u64,
    pub end_block: u64,
}

/// Bid event data.
#[derive(Debug, Serial)]
pub struct BidEvent {
    /// Bidder account address.
    pub bidder: AccountAddress,
    /// Bid amount.
    pub amount: Amount,
    /// Asking price in the block of the bid.
    pub price: Amount,
}

/// Refund of a superseded bid.
#[derive(Debug, Serial)]
pub struct RefundEvent {
    pub account: AccountAddress,
    pub amount: Amount,
}

/// Auction settlement event data.
#[derive(Debug, Serial)]
pub struct EndEvent {
    /// Address that ended the auction.
    pub caller: Address,
    pub seller: AccountAddress,
    /// Address of the auction winner, if there were any bids.
    pub winner: Option<AccountAddress>,
    /// Amount paid out to the seller.
    pub amount: Amount,
}

/// Tagged Custom event to be serialized for the event log.
#[derive(Debug)]
pub enum AuctionEvent {
    Init(InitEvent),
    Bid(BidEvent),
    Refund(RefundEvent),
    End(EndEvent),
}

impl AuctionEvent {
    pub fn init(
        seller: AccountAddress,
        reserve_price: Amount,
        initial_price: Amount,
        start_block: u64,
        end_block: u64,
    ) -> Self {
        Self::Init(InitEvent {
            seller,
            reserve_price,
            initial_price,
            start_block,
            end_block,
        })
    }

    pub fn bid(bidder: AccountAddress, amount: Amount, price: Amount) -> Self {
        Self::Bid(BidEvent {
            bidder,
            amount,
            price,
        })
    }

    pub fn refund(account: AccountAddress, amount: Amount) -> Self {
        Self::Refund(RefundEvent { account, amount })
    }

    pub fn end(
        caller: Address,
        seller: AccountAddress,
        winner: Option<AccountAddress>,
        amount: Amount,
    ) -> Self {
        Self::End(EndEvent {
            caller,
            seller,
            winner,
            amount,
        })
    }
}

impl Serial for AuctionEvent {
    fn serial<W: Write>(&self, out: &mut W) -> Result<(), W::Err> {
        match self {
            AuctionEvent::Init(event) => {
                out.write_u8(INIT_TAG)?;
                event.serial(out)
            }
            AuctionEvent::Bid(event) => {
                out.write_u8(BIDING_TAG)?;
                event.serial(out)
            }
            AuctionEvent::Refund(event) => {
                out.write_u8(REFUND_TAG)?;
                event.serial(out)
            }
            AuctionEvent::End(event) => {
                out.write_u8(FINALIZE_TAG)?;
                event.serial(out)
            }
        }
    }
}
