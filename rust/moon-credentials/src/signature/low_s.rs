use super::{RawSignature, SCALAR_LENGTH};

/// The secp256r1 group order `n`, big-endian.
///
/// Must match the verifying program bit for bit.
pub const SECP256R1_ORDER: [u8; SCALAR_LENGTH] = [
    0xff, 0xff, 0xff, 0xff, 0x00, 0x00, 0x00, 0x00, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff,
    0xbc, 0xe6, 0xfa, 0xad, 0xa7, 0x17, 0x9e, 0x84, 0xf3, 0xb9, 0xca, 0xc2, 0xfc, 0x63, 0x25, 0x51,
];

/// `floor(n / 2)`, big-endian.
pub const SECP256R1_HALF_ORDER: [u8; SCALAR_LENGTH] = [
    0x7f, 0xff, 0xff, 0xff, 0x80, 0x00, 0x00, 0x00, 0x7f, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff,
    0xde, 0x73, 0x7d, 0x56, 0xd3, 0x8b, 0xcf, 0x42, 0x79, 0xdc, 0xe5, 0x61, 0x7e, 0x31, 0x92, 0xa8,
];

/// Whether `s` already lies in the lower half of the group order.
pub fn is_low_s(signature: &RawSignature) -> bool {
    // Fixed-width big-endian arrays order the same way as the integers they hold.
    signature.s() <= SECP256R1_HALF_ORDER
}

/// Canonicalize a signature so that `s <= n / 2`.
///
/// When `s` is in the upper half it is replaced by `n - s`; `r` is never
/// touched. Normalizing an already normalized signature is a no-op.
///
/// The input is expected to be a valid signature (`s < n`); a larger `s` is
/// not a signature any verifier accepts and is not reduced here.
pub fn normalize_low_s(signature: &RawSignature) -> RawSignature {
    if is_low_s(signature) {
        return *signature;
    }
    let s = sub_be(&SECP256R1_ORDER, &signature.s());
    RawSignature::from_scalars(signature.r(), s)
}

fn sub_be(minuend: &[u8; SCALAR_LENGTH], subtrahend: &[u8; SCALAR_LENGTH]) -> [u8; SCALAR_LENGTH] {
    let mut difference = [0u8; SCALAR_LENGTH];
    let mut borrow = 0u16;
    for index in (0..SCALAR_LENGTH).rev() {
        let lhs = minuend[index] as u16;
        let rhs = subtrahend[index] as u16 + borrow;
        if lhs >= rhs {
            difference[index] = (lhs - rhs) as u8;
            borrow = 0;
        } else {
            difference[index] = (lhs + 0x100 - rhs) as u8;
            borrow = 1;
        }
    }
    difference
}
