//! 동기화 시스템 전반에서 사용되는 공통 타입.

mod decimal;
mod key;

pub use decimal::*;
pub use key::*;
