//! A Dutch auction for a single item.
//!
//! The asking price starts at `reserve + blocks * decrement` and drops by
//! `decrement` every block until it reaches the reserve. Accounts bid by
//! attaching CCD to `placeBid`; every new bid has to beat the highest one and
//! the superseded bid is refunded in the same call. Once the last block has
//! passed anyone may call `endAuction`, which pays the highest bid out to the
//! seller.
#![cfg_attr(not(feature = "std"), no_std)]

mod contract;
mod events;
mod external;
mod state;
