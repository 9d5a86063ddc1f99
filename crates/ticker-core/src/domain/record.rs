//! 동기화 엔진이 레코드에 요구하는 계약.

use std::fmt::Debug;

use crate::error::{TickerError, TickerResult};
use crate::types::{RecordKey, Ticker};

/// 저장소에 영속화되는 레코드 (StoreRecord).
pub trait SyncRecord: Clone + Debug + Send + Sync + 'static {
    /// 레코드 식별 키
    type Key: RecordKey;

    /// 레코드의 키.
    fn key(&self) -> Self::Key;

    /// 영속화되는 비즈니스 필드 중 하나라도 다르면 true.
    ///
    /// 타임스탬프와 대리 키(id)는 비교하지 않으며, Decimal은 허용 오차 없이 비교합니다.
    fn differs_from(&self, other: &Self) -> bool;
}

/// 외부 소스에서 조회한 레코드 (SourceRecord).
///
/// 직접 저장되지 않고 항상 검증/정규화를 거쳐 [`SyncRecord`]로 변환됩니다.
/// `A`는 소스가 키와 함께 제공하는 부가 속성입니다 (예: 거래소 태그).
pub trait SourceRecord<A = ()>: Send + 'static {
    /// 변환 결과 레코드 타입
    type Store: SyncRecord;

    /// 검증/정규화 후 저장 레코드로 변환합니다.
    fn into_store_record(self, attribute: Option<&A>) -> TickerResult<Self::Store>;
}

/// 테이블 컬럼 길이 제한이 더 짧은 티커를 검증합니다.
pub fn ensure_ticker_len(ticker: &Ticker, max_len: usize) -> TickerResult<()> {
    if ticker.len() > max_len {
        return Err(TickerError::validation(
            "ticker",
            ticker,
            format!("Ticker cannot be longer than {} characters", max_len),
        ));
    }
    Ok(())
}
