//! 저장소 협력 인터페이스.

use async_trait::async_trait;
use ticker_core::SyncRecord;

/// 엔진이 필요로 하는 대량 작업만 노출하는 저장소.
///
/// 각 대량 작업은 호출 단위로 트랜잭션입니다. 목록 전체가 반영되거나 에러를 반환합니다.
/// 테이블별 추가 조회 메서드는 구현 타입에 둡니다.
#[async_trait]
pub trait Repository: Send + Sync {
    /// 저장 레코드 타입
    type Record: SyncRecord;
    /// 저장소 에러 타입
    type Error: std::error::Error + Send + Sync + 'static;

    /// 현재 저장된 모든 레코드.
    async fn get_all(&self) -> Result<Vec<Self::Record>, Self::Error>;

    /// 새 레코드를 추가하고 반영된 행 수를 반환합니다.
    async fn bulk_insert(&self, records: &[Self::Record]) -> Result<u64, Self::Error>;

    /// 기존 레코드를 갱신하고 반영된 행 수를 반환합니다.
    async fn bulk_update(&self, records: &[Self::Record]) -> Result<u64, Self::Error>;

    /// 키에 해당하는 레코드를 삭제하고 삭제된 행 수를 반환합니다.
    async fn bulk_delete(
        &self,
        keys: &[<Self::Record as SyncRecord>::Key],
    ) -> Result<u64, Self::Error>;

    /// 저장된 행 수.
    async fn count(&self) -> Result<u64, Self::Error>;
}

#[async_trait]
impl<'a, T: Repository + ?Sized> Repository for &'a T {
    type Record = T::Record;
    type Error = T::Error;

    async fn get_all(&self) -> Result<Vec<Self::Record>, Self::Error> {
        (**self).get_all().await
    }

    async fn bulk_insert(&self, records: &[Self::Record]) -> Result<u64, Self::Error> {
        (**self).bulk_insert(records).await
    }

    async fn bulk_update(&self, records: &[Self::Record]) -> Result<u64, Self::Error> {
        (**self).bulk_update(records).await
    }

    async fn bulk_delete(
        &self,
        keys: &[<Self::Record as SyncRecord>::Key],
    ) -> Result<u64, Self::Error> {
        (**self).bulk_delete(keys).await
    }

    async fn count(&self) -> Result<u64, Self::Error> {
        (**self).count().await
    }
}
