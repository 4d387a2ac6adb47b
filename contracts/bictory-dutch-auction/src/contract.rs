use commons::{ContractResult, CustomContractError};
use concordium_std::*;

use crate::events::AuctionEvent;
use crate::external::{AuctionView, InitParams};
use crate::state::{block_index, AuctionResult, State};

/// Initialize the auction. The init origin becomes the seller and the block
/// of the init slot time becomes the start block.
///
/// It rejects if:
/// - Fails to parse `InitParams` parameters;
/// - Zero blocks open or zero block time;
/// - Initial price or end block overflow;
/// - Fails to log `Init` event.
#[init(contract = "BictoryDutchAuction", parameter = "InitParams", enable_logger)]
fn contract_init<S: HasStateApi>(
    ctx: &impl HasInitContext,
    _state_builder: &mut StateBuilder<S>,
    logger: &mut impl HasLogger,
) -> InitResult<State> {
    let params: InitParams = ctx.parameter_cursor().get()?;
    let reserve_price = params.reserve_price;

    let start_block = block_index(ctx.metadata().slot_time(), params.block_time)
        .ok_or(CustomContractError::InvalidParameters)?;
    let state = State::new(ctx.init_origin(), params, start_block)?;

    logger
        .log(&AuctionEvent::init(
            state.seller(),
            reserve_price,
            state.initial_price(),
            state.start_block(),
            state.end_block(),
        ))
        .map_err(CustomContractError::from)?;

    Ok(state)
}

/// Place a bid with the attached amount. The superseded bid is refunded in
/// the same call.
///
/// It rejects if:
/// - Sender is a contract;
/// - Auction has ended or its end block is reached;
/// - Amount does not exceed the highest bid;
/// - Fails to log `Bid` or `Refund` events;
/// - Refund could not be transferred to the previous bidder.
#[receive(
    mutable,
    payable,
    contract = "BictoryDutchAuction",
    name = "placeBid",
    enable_logger
)]
fn contract_place_bid<S: HasStateApi>(
    ctx: &impl HasReceiveContext,
    host: &mut impl HasHost<State, StateApiType = S>,
    amount: Amount,
    logger: &mut impl HasLogger,
) -> ContractResult<()> {
    let bidder = match ctx.sender() {
        Address::Account(bidder) => bidder,
        Address::Contract(_) => bail!(CustomContractError::OnlyAccountAddress),
    };

    let state = host.state_mut();
    let current_block = state.block_at(ctx.metadata().slot_time());
    let price = state.current_price(current_block);
    let previous_bid = state.bid(bidder, amount, current_block)?;

    logger.log(&AuctionEvent::bid(bidder, amount, price))?;

    // Refund previous bid
    if let Some(bid) = previous_bid {
        logger.log(&AuctionEvent::refund(bid.account, bid.amount))?;
        host.invoke_transfer(&bid.account, bid.amount)?;
    }

    Ok(())
}

/// End the auction and pay the highest bid out to the seller. Any address
/// may call it once the end block is reached.
///
/// It rejects if:
/// - Auction has already ended;
/// - End block is not reached yet;
/// - Fails to log `End` event;
/// - Highest bid could not be transferred to the seller.
#[receive(
    mutable,
    contract = "BictoryDutchAuction",
    name = "endAuction",
    enable_logger
)]
fn contract_end_auction<S: HasStateApi>(
    ctx: &impl HasReceiveContext,
    host: &mut impl HasHost<State, StateApiType = S>,
    logger: &mut impl HasLogger,
) -> ContractResult<()> {
    let state = host.state_mut();
    let current_block = state.block_at(ctx.metadata().slot_time());

    match state.end(current_block)? {
        AuctionResult::Winner {
            seller,
            winning_bid,
        } => {
            logger.log(&AuctionEvent::end(
                ctx.sender(),
                seller,
                Some(winning_bid.account),
                winning_bid.amount,
            ))?;
            host.invoke_transfer(&seller, winning_bid.amount)?;
        }
        AuctionResult::NoBids(seller) => {
            logger.log(&AuctionEvent::end(
                ctx.sender(),
                seller,
                None,
                Amount::zero(),
            ))?;
        }
    }

    Ok(())
}

/// View function that returns the asking price in the current block.
#[receive(
    contract = "BictoryDutchAuction",
    name = "currentPrice",
    return_value = "Amount"
)]
fn contract_current_price<S: HasStateApi>(
    ctx: &impl HasReceiveContext,
    host: &impl HasHost<State, StateApiType = S>,
) -> ReceiveResult<Amount> {
    let state = host.state();
    let current_block = state.block_at(ctx.metadata().slot_time());
    Ok(state.current_price(current_block))
}

/// View function that returns the auction state together with the current
/// block and price.
#[receive(
    contract = "BictoryDutchAuction",
    name = "view",
    return_value = "AuctionView"
)]
fn contract_view<S: HasStateApi>(
    ctx: &impl HasReceiveContext,
    host: &impl HasHost<State, StateApiType = S>,
) -> ReceiveResult<AuctionView> {
    let state = host.state();
    let current_block = state.block_at(ctx.metadata().slot_time());
    Ok(state.view(current_block))
}

#[concordium_cfg_test]
mod tests {
    use super::*;
    use test_infrastructure::*;

    const SELLER: AccountAddress = AccountAddress([0u8; 32]);
    const BIDDER_1: AccountAddress = AccountAddress([1u8; 32]);
    const BIDDER_2: AccountAddress = AccountAddress([2u8; 32]);
    const STRANGER: AccountAddress = AccountAddress([3u8; 32]);

    const BLOCK_TIME_MILLIS: u64 = 2_000;
    const BLOCKS_OPEN: u64 = 10;

    fn ccd_tenths(tenths: u64) -> Amount {
        Amount::from_micro_ccd(tenths * 100_000)
    }

    fn slot_time(block: u64) -> Timestamp {
        Timestamp::from_timestamp_millis(block * BLOCK_TIME_MILLIS)
    }

    /// Reserve of 1 CCD, 10 blocks open and 0.1 CCD decrement.
    fn init_params() -> InitParams {
        InitParams {
            reserve_price: ccd_tenths(10),
            num_blocks_open: BLOCKS_OPEN,
            price_decrement: ccd_tenths(1),
            block_time: Duration::from_millis(BLOCK_TIME_MILLIS),
        }
    }

    fn init_with(
        params: &InitParams,
        block: u64,
        logger: &mut TestLogger,
    ) -> (InitResult<State>, TestStateBuilder) {
        let parameter_bytes = to_bytes(params);
        let mut ctx = TestInitContext::empty();
        ctx.set_init_origin(SELLER)
            .set_parameter(&parameter_bytes)
            .set_metadata_slot_time(slot_time(block));
        let mut state_builder = TestStateBuilder::new();

        let result = contract_init(&ctx, &mut state_builder, logger);
        (result, state_builder)
    }

    fn new_host() -> TestHost<State> {
        let mut logger = TestLogger::init();
        let (result, state_builder) = init_with(&init_params(), 0, &mut logger);
        let state = result.expect_report("Failed during init_BictoryDutchAuction");
        TestHost::new(state, state_builder)
    }

    fn receive_ctx<'a>(sender: Address, block: u64) -> TestReceiveContext<'a> {
        let mut ctx = TestReceiveContext::empty();
        ctx.set_sender(sender)
            .set_owner(SELLER)
            .set_metadata_slot_time(slot_time(block));
        ctx
    }

    /// Calls `placeBid` the way the chain does: the attached amount is added
    /// to the contract balance and a rejection rolls the state back.
    fn place_bid(
        host: &mut TestHost<State>,
        logger: &mut TestLogger,
        bidder: AccountAddress,
        amount: Amount,
        block: u64,
    ) -> ContractResult<()> {
        let ctx = receive_ctx(Address::Account(bidder), block);
        host.set_self_balance(host.self_balance() + amount);
        host.with_rollback(|host| contract_place_bid(&ctx, host, amount, logger))
    }

    fn end_auction(
        host: &mut TestHost<State>,
        logger: &mut TestLogger,
        caller: AccountAddress,
        block: u64,
    ) -> ContractResult<()> {
        let ctx = receive_ctx(Address::Account(caller), block);
        host.with_rollback(|host| contract_end_auction(&ctx, host, logger))
    }

    fn view_at(host: &TestHost<State>, block: u64) -> AuctionView {
        let ctx = receive_ctx(Address::Account(STRANGER), block);
        contract_view(&ctx, host).expect_report("Failed to call view")
    }

    #[concordium_test]
    /// Test that the initialization sets the state correctly: no bids, not
    /// ended, initial price at reserve plus the full decrement.
    fn test_init() {
        let mut logger = TestLogger::init();
        let (result, _) = init_with(&init_params(), 7, &mut logger);
        let state = result.expect_report("Contract initialization results in error");

        let view = state.view(7);
        claim_eq!(view.seller, SELLER);
        claim_eq!(view.reserve_price, ccd_tenths(10));
        claim_eq!(view.num_blocks_open, BLOCKS_OPEN);
        claim_eq!(view.price_decrement, ccd_tenths(1));
        claim_eq!(view.initial_price, ccd_tenths(20));
        claim_eq!(view.start_block, 7);
        claim_eq!(view.end_block, 7 + BLOCKS_OPEN);
        claim_eq!(view.current_price, ccd_tenths(20));
        claim_eq!(view.highest_bid, Amount::zero());
        claim_eq!(view.highest_bidder, None);
        claim!(!view.ended, "Auction should not be ended after initialization");

        claim_eq!(
            logger.logs,
            vec![to_bytes(&AuctionEvent::init(
                SELLER,
                ccd_tenths(10),
                ccd_tenths(20),
                7,
                7 + BLOCKS_OPEN,
            ))]
        );
    }

    #[concordium_test]
    fn test_init_invalid_parameters() {
        let mut logger = TestLogger::init();

        let mut zero_blocks = init_params();
        zero_blocks.num_blocks_open = 0;
        let (result, _) = init_with(&zero_blocks, 0, &mut logger);
        claim!(result.is_err(), "Zero blocks open should be rejected");

        let mut zero_block_time = init_params();
        zero_block_time.block_time = Duration::from_millis(0);
        let (result, _) = init_with(&zero_block_time, 0, &mut logger);
        claim!(result.is_err(), "Zero block time should be rejected");

        claim!(logger.logs.is_empty(), "Rejected init should not log");
    }

    #[concordium_test]
    fn test_current_price() {
        let host = new_host();

        let price_at = |block: u64| {
            let ctx = receive_ctx(Address::Account(STRANGER), block);
            contract_current_price(&ctx, &host).expect_report("Failed to call currentPrice")
        };

        claim_eq!(price_at(0), ccd_tenths(20));
        claim_eq!(price_at(3), ccd_tenths(17));
        claim_eq!(price_at(BLOCKS_OPEN), ccd_tenths(10));
        claim_eq!(price_at(BLOCKS_OPEN * 3), ccd_tenths(10));
    }

    #[concordium_test]
    fn test_bid() {
        let mut host = new_host();
        let mut logger = TestLogger::init();

        let result = place_bid(&mut host, &mut logger, BIDDER_1, ccd_tenths(15), 2);
        claim_eq!(result, Ok(()));

        let view = view_at(&host, 2);
        claim_eq!(view.highest_bid, ccd_tenths(15));
        claim_eq!(view.highest_bidder, Some(BIDDER_1));
        claim!(host.get_transfers().is_empty(), "First bid should not refund");
        claim_eq!(
            logger.logs,
            vec![to_bytes(&AuctionEvent::bid(BIDDER_1, ccd_tenths(15), ccd_tenths(18)))]
        );
    }

    #[concordium_test]
    /// Test a sequence of bids and the settlement:
    /// 1. Bidder 1 bids 1.5 CCD.
    /// 2. Bidder 2 bids 2 CCD, bidder 1 gets 1.5 CCD back.
    /// 3. Ending before the end block fails.
    /// 4. The seller ends the auction and receives 2 CCD.
    /// 5. Attempts to subsequently bid or end fail.
    fn test_auction_bid_refund_and_end() {
        let mut host = new_host();
        let mut logger = TestLogger::init();

        claim_eq!(
            place_bid(&mut host, &mut logger, BIDDER_1, ccd_tenths(15), 1),
            Ok(())
        );
        claim_eq!(
            place_bid(&mut host, &mut logger, BIDDER_2, ccd_tenths(20), 2),
            Ok(())
        );

        let view = view_at(&host, 2);
        claim_eq!(view.highest_bid, ccd_tenths(20));
        claim_eq!(view.highest_bidder, Some(BIDDER_2));
        claim_eq!(host.get_transfers(), vec![(BIDDER_1, ccd_tenths(15))]);
        claim!(
            logger
                .logs
                .contains(&to_bytes(&AuctionEvent::refund(BIDDER_1, ccd_tenths(15)))),
            "Refund should be logged"
        );

        claim_eq!(
            end_auction(&mut host, &mut logger, SELLER, BLOCKS_OPEN - 1),
            Err(CustomContractError::AuctionNotYetEndable)
        );
        claim!(!view_at(&host, BLOCKS_OPEN - 1).ended);

        claim_eq!(
            end_auction(&mut host, &mut logger, SELLER, BLOCKS_OPEN),
            Ok(())
        );
        claim!(view_at(&host, BLOCKS_OPEN).ended);
        claim!(
            host.transfer_occurred(&SELLER, ccd_tenths(20)),
            "Seller should receive the highest bid"
        );
        claim_eq!(host.get_transfers().len(), 2);
        claim_eq!(
            logger.logs.last(),
            Some(&to_bytes(&AuctionEvent::end(
                Address::Account(SELLER),
                SELLER,
                Some(BIDDER_2),
                ccd_tenths(20),
            )))
        );

        claim_eq!(
            end_auction(&mut host, &mut logger, SELLER, BLOCKS_OPEN + 1),
            Err(CustomContractError::AuctionAlreadyEnded)
        );
        claim_eq!(
            place_bid(&mut host, &mut logger, BIDDER_1, ccd_tenths(30), BLOCKS_OPEN + 1),
            Err(CustomContractError::AuctionEnded)
        );

        let view = view_at(&host, BLOCKS_OPEN + 1);
        claim_eq!(view.highest_bid, ccd_tenths(20));
        claim_eq!(view.highest_bidder, Some(BIDDER_2));
        claim_eq!(host.get_transfers().len(), 2);
    }

    #[concordium_test]
    /// Bids for amounts lower or equal to the highest bid should be rejected.
    fn test_bid_too_low() {
        let mut host = new_host();
        let mut logger = TestLogger::init();

        claim_eq!(
            place_bid(&mut host, &mut logger, BIDDER_1, Amount::zero(), 0),
            Err(CustomContractError::BidTooLow)
        );
        claim_eq!(
            place_bid(&mut host, &mut logger, BIDDER_1, ccd_tenths(15), 0),
            Ok(())
        );
        claim_eq!(
            place_bid(&mut host, &mut logger, BIDDER_2, ccd_tenths(15), 1),
            Err(CustomContractError::BidTooLow)
        );

        let view = view_at(&host, 1);
        claim_eq!(view.highest_bid, ccd_tenths(15));
        claim_eq!(view.highest_bidder, Some(BIDDER_1));
        claim!(host.get_transfers().is_empty(), "Rejected bids should not refund");
    }

    #[concordium_test]
    fn test_bid_at_end_block() {
        let mut host = new_host();
        let mut logger = TestLogger::init();

        claim_eq!(
            place_bid(&mut host, &mut logger, BIDDER_1, ccd_tenths(15), BLOCKS_OPEN),
            Err(CustomContractError::AuctionEnded)
        );
        claim_eq!(view_at(&host, BLOCKS_OPEN).highest_bidder, None);
    }

    #[concordium_test]
    fn test_bid_after_end() {
        let mut host = new_host();
        let mut logger = TestLogger::init();

        claim_eq!(
            end_auction(&mut host, &mut logger, SELLER, BLOCKS_OPEN),
            Ok(())
        );
        claim_eq!(
            place_bid(&mut host, &mut logger, BIDDER_1, ccd_tenths(15), BLOCKS_OPEN),
            Err(CustomContractError::AuctionEnded)
        );
    }

    #[concordium_test]
    fn test_contract_cannot_bid() {
        let mut host = new_host();
        let mut logger = TestLogger::init();
        let ctx = receive_ctx(
            Address::Contract(ContractAddress {
                index: 1,
                subindex: 0,
            }),
            0,
        );

        let result = contract_place_bid(&ctx, &mut host, ccd_tenths(15), &mut logger);
        claim_eq!(result, Err(CustomContractError::OnlyAccountAddress));
        claim_eq!(view_at(&host, 0).highest_bid, Amount::zero());
    }

    #[concordium_test]
    /// Ending without bids settles nothing, and anybody may end.
    fn test_end_without_bids() {
        let mut host = new_host();
        let mut logger = TestLogger::init();

        claim_eq!(
            end_auction(&mut host, &mut logger, STRANGER, BLOCKS_OPEN + 5),
            Ok(())
        );
        claim!(view_at(&host, BLOCKS_OPEN + 5).ended);
        claim!(host.get_transfers().is_empty(), "Nothing to pay out");
        claim_eq!(
            logger.logs,
            vec![to_bytes(&AuctionEvent::end(
                Address::Account(STRANGER),
                SELLER,
                None,
                Amount::zero(),
            ))]
        );
    }

    #[concordium_test]
    /// A refund that can't be delivered rejects the new bid and keeps the
    /// previous bidder in place.
    fn test_failed_refund_rolls_back() {
        let mut host = new_host();
        let mut logger = TestLogger::init();

        claim_eq!(
            place_bid(&mut host, &mut logger, BIDDER_1, ccd_tenths(15), 1),
            Ok(())
        );
        host.make_account_missing(BIDDER_1);

        claim_eq!(
            place_bid(&mut host, &mut logger, BIDDER_2, ccd_tenths(20), 2),
            Err(CustomContractError::TransferFailed)
        );

        let view = view_at(&host, 2);
        claim_eq!(view.highest_bid, ccd_tenths(15));
        claim_eq!(view.highest_bidder, Some(BIDDER_1));
        claim!(host.get_transfers().is_empty(), "No refund should be recorded");
    }

    #[concordium_test]
    /// A payout that can't be delivered keeps the auction open for ending.
    fn test_failed_settlement_rolls_back() {
        let mut host = new_host();
        let mut logger = TestLogger::init();

        claim_eq!(
            place_bid(&mut host, &mut logger, BIDDER_1, ccd_tenths(20), 1),
            Ok(())
        );
        host.make_account_missing(SELLER);

        claim_eq!(
            end_auction(&mut host, &mut logger, SELLER, BLOCKS_OPEN),
            Err(CustomContractError::TransferFailed)
        );
        claim!(!view_at(&host, BLOCKS_OPEN).ended);
        claim!(host.get_transfers().is_empty(), "No payout should be recorded");
    }
}
