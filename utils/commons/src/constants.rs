/// Tag for the Custom Auction Init event.
pub const INIT_TAG: u8 = u8::MAX - 8;

/// Tag for the Custom Biding event.
pub const BIDING_TAG: u8 = u8::MAX - 11;

/// Tag for the Custom Finalize Biding event.
pub const FINALIZE_TAG: u8 = u8::MAX - 12;

/// Tag for the Custom Refund event.
pub const REFUND_TAG: u8 = u8::MAX - 23;
