//! # Ticker Core
//!
//! 종목 메타데이터 동기화 작업의 핵심 타입을 제공합니다.
//!
//! 이 크레이트는 동기화 시스템 전반에서 사용되는 기본 타입을 제공합니다:
//! - 정규화된 키 타입 (`Ticker`, `Cik`)
//! - 다섯 개 테이블의 엔티티 모델 및 필드 검증
//! - 소수점 정규화 유틸리티 (퍼센트 변환, 컬럼 정밀도 맞춤)
//! - 설정 관리
//! - 로깅 인프라

pub mod config;
pub mod domain;
pub mod error;
pub mod logging;
pub mod types;

pub use config::*;
pub use domain::*;
pub use error::*;
pub use logging::*;
pub use types::*;
