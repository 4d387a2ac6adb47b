//! It exposes all common errors, constants and types.
#![cfg_attr(not(feature = "std"), no_std)]
pub use crate::{constants::*, errors::*, types::*};
use concordium_std::*;

mod constants;
mod errors;
mod types;
