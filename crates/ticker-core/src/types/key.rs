//! 레코드 식별 키 타입.
//!
//! 소스와 저장소 양쪽에서 같은 레코드를 가리키는 정규화된 식별자입니다.
//! 비교 전에 항상 한 가지 형태로 정규화됩니다.

use std::fmt;
use std::hash::Hash;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize};

use crate::error::{TickerError, TickerResult};

/// 동기화 엔진이 다룰 수 있는 키의 공통 요구사항.
pub trait RecordKey:
    Clone + Eq + Hash + Ord + fmt::Display + fmt::Debug + Send + Sync + 'static
{
}

impl<T> RecordKey for T where
    T: Clone + Eq + Hash + Ord + fmt::Display + fmt::Debug + Send + Sync + 'static
{
}

/// 티커 최대 길이.
pub const MAX_TICKER_LEN: usize = 20;

/// 정규화된 종목 티커 (예: "AAPL", "BRK-B").
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct Ticker(String);

impl Ticker {
    /// 원본 문자열을 정규화하여 티커를 생성합니다.
    ///
    /// 공백 제거, 대문자 변환, `/`와 `\`를 `-`로 치환한 뒤 검증합니다.
    pub fn parse(raw: &str) -> TickerResult<Self> {
        let normalized: String = raw
            .trim()
            .chars()
            .map(|c| match c {
                '/' | '\\' => '-',
                c => c.to_ascii_uppercase(),
            })
            .collect();

        if normalized.is_empty() {
            return Err(TickerError::InvalidKey("빈 티커".to_string()));
        }
        if normalized.len() > MAX_TICKER_LEN {
            return Err(TickerError::InvalidKey(format!(
                "티커 길이 초과 ({} > {}): {}",
                normalized.len(),
                MAX_TICKER_LEN,
                normalized
            )));
        }
        if let Some(bad) = normalized
            .chars()
            .find(|c| !(c.is_ascii_uppercase() || c.is_ascii_digit() || *c == '.' || *c == '-'))
        {
            return Err(TickerError::InvalidKey(format!(
                "허용되지 않는 문자 '{}': {}",
                bad, normalized
            )));
        }

        Ok(Self(normalized))
    }

    /// 티커 문자열.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// 문자 수.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// 항상 false (빈 티커는 생성되지 않음).
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for Ticker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for Ticker {
    type Err = TickerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl AsRef<str> for Ticker {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl<'de> Deserialize<'de> for Ticker {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Ticker::parse(&raw).map_err(serde::de::Error::custom)
    }
}

/// SEC Central Index Key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct Cik(i64);

impl Cik {
    /// 양의 정수로부터 CIK를 생성합니다.
    pub fn new(value: i64) -> TickerResult<Self> {
        if value <= 0 {
            return Err(TickerError::InvalidKey(format!(
                "CIK는 양수여야 합니다: {}",
                value
            )));
        }
        Ok(Self(value))
    }

    /// 정수 값.
    pub fn value(&self) -> i64 {
        self.0
    }

    /// SEC 형식의 10자리 0 채움 문자열 (예: "0000320193").
    pub fn padded(&self) -> String {
        format!("{:010}", self.0)
    }
}

impl fmt::Display for Cik {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for Cik {
    type Err = TickerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let value: i64 = trimmed
            .parse()
            .map_err(|_| TickerError::InvalidKey(format!("숫자가 아닌 CIK: {}", trimmed)))?;
        Self::new(value)
    }
}

impl TryFrom<i64> for Cik {
    type Error = TickerError;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl<'de> Deserialize<'de> for Cik {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Number(i64),
            Text(String),
        }

        match Raw::deserialize(deserializer)? {
            Raw::Number(n) => Cik::new(n),
            Raw::Text(s) => s.parse(),
        }
        .map_err(serde::de::Error::custom)
    }
}
