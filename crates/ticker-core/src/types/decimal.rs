//! 외부 시세 데이터를 DB 컬럼 정밀도에 맞추는 Decimal 유틸리티.
//!
//! Yahoo Finance 등은 비율을 0.XXXX 형식의 `f64`로 내려주고, DB 컬럼은
//! `NUMERIC(p, s)`로 정밀도가 고정되어 있습니다. 이 모듈은 그 사이의 변환을 담당합니다.

use rust_decimal::{Decimal, RoundingStrategy};

/// 퍼센트 타입 (12.34 = 12.34%).
pub type Percentage = Decimal;

/// `f64`를 Decimal로 변환합니다.
///
/// 최단 표현 문자열을 거쳐 변환하므로 0.1 은 0.1 그대로 유지됩니다.
/// NaN, 무한대, Decimal 범위를 벗어나는 값은 `None`을 반환합니다.
pub fn decimal_from_f64(value: f64) -> Option<Decimal> {
    if !value.is_finite() {
        return None;
    }
    value.to_string().parse::<Decimal>().ok()
}

/// 0.XXXX 형식의 비율을 XX.XX 형식의 퍼센트로 변환합니다.
///
/// 절대값이 1 이하인 값만 100을 곱합니다. 이미 퍼센트 단위인 값
/// (예: 성장률 250%가 2.5가 아닌 250으로 오는 경우)은 그대로 둡니다.
/// 결과는 소수점 둘째 자리로 반올림합니다 (정확히 중간이면 짝수 쪽).
pub fn to_percentage(value: Decimal) -> Percentage {
    let scaled = if value.abs() <= Decimal::ONE {
        value * Decimal::ONE_HUNDRED
    } else {
        value
    };
    scaled.round_dp_with_strategy(2, RoundingStrategy::MidpointNearestEven)
}

/// `f64` 비율을 퍼센트로 변환합니다 (유효하지 않은 값은 `None`).
pub fn f64_to_percentage(value: Option<f64>) -> Option<Percentage> {
    value.and_then(decimal_from_f64).map(to_percentage)
}

/// `NUMERIC(max_digits, scale)` 컬럼에 들어갈 수 있도록 값을 맞춥니다.
///
/// `scale` 자리로 반올림(중간값은 짝수 쪽)한 뒤 `±(10^(max_digits-scale) - 10^-scale)` 범위를
/// 벗어나면 `None`을 반환합니다.
pub fn sanitize_decimal(value: Option<Decimal>, max_digits: u32, scale: u32) -> Option<Decimal> {
    let value = value?;
    let rounded = value.round_dp_with_strategy(scale, RoundingStrategy::MidpointNearestEven);
    let limit = column_limit(max_digits, scale)?;

    if rounded.abs() > limit {
        tracing::warn!(
            value = %rounded,
            max_digits,
            scale,
            "컬럼 정밀도 초과, NULL로 저장"
        );
        return None;
    }

    Some(rounded)
}

/// `NUMERIC(max_digits, scale)` 컬럼의 최대 절대값.
pub fn column_limit(max_digits: u32, scale: u32) -> Option<Decimal> {
    if scale > max_digits || max_digits > 28 {
        return None;
    }
    let mantissa = 10i128.checked_pow(max_digits)? - 1;
    Some(Decimal::from_i128_with_scale(mantissa, scale))
}
