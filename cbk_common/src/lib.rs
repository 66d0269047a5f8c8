pub mod helpers;
pub mod op;
mod rate;
mod secret;
mod vnd;

pub use rate::{Rate, RateConversionError, BASIS_POINTS_PER_UNIT};
pub use secret::Secret;
pub use vnd::{Vnd, VndConversionError, VND_CURRENCY_CODE};
