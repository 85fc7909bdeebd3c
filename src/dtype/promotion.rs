//! Type promotion rules for binary operations and floating promotion

use super::DType;

/// Promote two dtypes to a common dtype for binary operations
///
/// Follows NumPy-like promotion rules: complex wins over real, floats win
/// over integers, larger types win over smaller types.
pub fn promote(lhs: DType, rhs: DType) -> DType {
    use DType::*;

    if lhs == rhs {
        return lhs;
    }

    // Promotion priority (higher = wins)
    let priority = |dt: DType| -> u8 {
        match dt {
            C128 => 60,
            C64 => 50,
            F64 => 40,
            F32 => 30,
            I64 => 20,
            I32 => 10,
        }
    };

    // Mixing a wide real with a narrow complex keeps the component width:
    // f64 + c64 carries 64-bit real information, so the result is c128.
    if lhs == F64 && rhs == C64 || lhs == C64 && rhs == F64 {
        return C128;
    }

    if priority(lhs) >= priority(rhs) {
        lhs
    } else {
        rhs
    }
}

/// Promote a dtype to the floating (or complex) type arithmetic runs in
///
/// Integer inputs map to the default float; floating and complex inputs are
/// already arithmetic-ready. Every operation applies this before any numeric
/// work, so shape/type templates can be produced without touching data.
pub fn to_floating(dtype: DType) -> DType {
    if dtype.is_int() {
        DType::default_float()
    } else {
        dtype
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use DType::*;

    #[test]
    fn test_same_type_promotion() {
        assert_eq!(promote(F32, F32), F32);
        assert_eq!(promote(C128, C128), C128);
    }

    #[test]
    fn test_float_promotion() {
        assert_eq!(promote(F32, F64), F64);
        assert_eq!(promote(I64, F32), F32);
        assert_eq!(promote(I32, I64), I64);
    }

    #[test]
    fn test_complex_promotion() {
        assert_eq!(promote(F32, C64), C64);
        assert_eq!(promote(F64, C64), C128);
        assert_eq!(promote(C64, C128), C128);
        assert_eq!(promote(I64, C128), C128);
    }

    #[test]
    fn test_to_floating() {
        assert_eq!(to_floating(I32), F32);
        assert_eq!(to_floating(I64), F32);
        assert_eq!(to_floating(F64), F64);
        assert_eq!(to_floating(C64), C64);
    }
}
