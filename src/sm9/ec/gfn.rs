use subtle::{Choice, ConditionallySelectable, ConstantTimeEq};

use crate::sm2::ec::arith::*;
use crate::sm2::ec::LIMB;

// n = 36u^4 + 36u^3 + 18u^2 + 6u + 1
const N: [LIMB; 4] = [0xe56ee19cd69ecf25, 0x49f2934b18ea8bee, 0xd603ab4ff58ec744, 0xb640000002a3a6f1];
const N_MINUS_2: [LIMB; 4] = [0xe56ee19cd69ecf23, 0x49f2934b18ea8bee, 0xd603ab4ff58ec744, 0xb640000002a3a6f1];
const N_INV: LIMB = mont_neg_inv(N[0]);
const R: [LIMB; 4] = [0x1a911e63296130db, 0xb60d6cb4e7157411, 0x29fc54b00a7138bb, 0x49bffffffd5c590e];
const RR: [LIMB; 4] = [0x7598cd79cd750c35, 0xe4a08110bb6daeab, 0xbfee4bae7d78a1f9, 0x8894f5d163695d0e];

/// Scalars modulo the group order n, stored canonically in [0,n).
#[derive(Default, Debug, Copy, Clone, PartialEq, Eq)]
pub struct GFnElement {
    pub(crate) limbs: [LIMB; 4],
}

#[inline(always)]
fn mont_mul(a: &[LIMB; 4], b: &[LIMB; 4]) -> [LIMB; 4] {
    let t = mul256(a[0], a[1], a[2], a[3], b[0], b[1], b[2], b[3]);
    montgomery_reduce_generic([t.0, t.1, t.2, t.3, t.4, t.5, t.6, t.7], &N, N_INV)
}

impl From<&[u8; 32]> for GFnElement {
    /// Reduces any 256-bit value; 2^256 < 2n so one subtraction suffices.
    fn from(v: &[u8; 32]) -> Self {
        let a = limbs_from_be_bytes(v);
        let (l0, l1, l2, l3) = sub256_conditional(a[0], a[1], a[2], a[3], 0, N[0], N[1], N[2], N[3]);
        GFnElement { limbs: [l0, l1, l2, l3] }
    }
}

impl GFnElement {
    pub const N: GFnElement = GFnElement { limbs: N };
    pub const ZERO: GFnElement = GFnElement { limbs: [0; 4] };
    pub const ONE: GFnElement = GFnElement { limbs: [1, 0, 0, 0] };

    pub fn from_u64(v: u64) -> Self {
        GFnElement { limbs: [v, 0, 0, 0] }
    }

    /// Parses a big-endian integer, requiring it to be in [0,n).
    pub fn from_be_bytes_checked(b: &[u8; 32]) -> Option<GFnElement> {
        let limbs = limbs_from_be_bytes(b);
        if bool::from(less_than256(&limbs, &N)) { Some(GFnElement { limbs }) } else { None }
    }

    pub fn to_be_bytes(&self) -> [u8; 32] {
        limbs_to_be_bytes(&self.limbs)
    }

    #[inline]
    pub fn is_zero(&self) -> Choice {
        is_zero256(&self.limbs)
    }

    pub fn new_from_add(a: &GFnElement, b: &GFnElement) -> GFnElement {
        let (a, b) = (&a.limbs, &b.limbs);
        let (t0, t1, t2, t3, carry) = add256(a[0], a[1], a[2], a[3], b[0], b[1], b[2], b[3]);
        let (l0, l1, l2, l3) = sub256_conditional(t0, t1, t2, t3, carry as LIMB, N[0], N[1], N[2], N[3]);
        GFnElement { limbs: [l0, l1, l2, l3] }
    }

    pub fn new_from_sub(a: &GFnElement, b: &GFnElement) -> GFnElement {
        let (a, b) = (&a.limbs, &b.limbs);
        let (t0, t1, t2, t3, borrow) = sub256(a[0], a[1], a[2], a[3], b[0], b[1], b[2], b[3]);
        let (l0, l1, l2, l3) = add256_conditional(t0, t1, t2, t3, borrow, N[0], N[1], N[2], N[3]);
        GFnElement { limbs: [l0, l1, l2, l3] }
    }

    pub fn neg_move(self) -> GFnElement {
        GFnElement::new_from_sub(&GFnElement::ZERO, &self)
    }

    /// Returns a*b mod n.
    pub fn mul_plain(a: &GFnElement, b: &GFnElement) -> GFnElement {
        // (a*b/R) * R^2 / R
        GFnElement { limbs: mont_mul(&mont_mul(&a.limbs, &b.limbs), &RR) }
    }

    /// Returns a^-1 mod n; zero maps to zero.
    pub fn invert_plain(a: &GFnElement) -> GFnElement {
        let base = mont_mul(&a.limbs, &RR);
        let mut acc = R;
        for i in (0..256).rev() {
            acc = mont_mul(&acc, &acc);
            if (N_MINUS_2[i / 64] >> (i % 64)) & 1 == 1 {
                acc = mont_mul(&acc, &base);
            }
        }
        GFnElement { limbs: mont_mul(&acc, &[1, 0, 0, 0]) }
    }
}

impl ConditionallySelectable for GFnElement {
    fn conditional_select(a: &Self, b: &Self, choice: Choice) -> Self {
        let mut limbs = a.limbs;
        for (l, r) in limbs.iter_mut().zip(b.limbs.iter()) {
            l.conditional_assign(r, choice);
        }
        GFnElement { limbs }
    }
}

impl ConstantTimeEq for GFnElement {
    fn ct_eq(&self, other: &Self) -> Choice {
        constant_eq256(&self.limbs, &other.limbs)
    }
}
