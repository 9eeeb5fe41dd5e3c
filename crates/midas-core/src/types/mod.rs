//! 서비스 전반에서 사용되는 공통 타입.

mod market_data;
mod symbol;

pub use market_data::*;
pub use symbol::*;
