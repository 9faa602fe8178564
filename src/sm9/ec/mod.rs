//! Tower fields, groups and pairing of the SM9 BN curve.
//!
//! ```text
//! Fp2  = Fp[u]/(u^2 + 2)
//! Fp4  = Fp2[v]/(v^2 - u)      Fp6    = Fp2[s]/(s^3 - u)
//! Fp12 = Fp4[w]/(w^3 - v)      Fp12b6 = Fp6[t]/(t^2 - s)
//! ```
//!
//! G1 is `y^2 = x^3 + 5` over Fp, G2 the sextic twist `y^2 = x^3 + 5u`
//! over Fp2 and GT the order-n subgroup of Fp12.

/// Projective points on an `a = 0` curve with the complete formulas of
/// Renes, Costello and Batina (algorithms 7 and 9). The identity is (0:1:0).
macro_rules! impl_projective_point {
    ($point:ident, $field:ty, $b3:expr, $invert:expr) => {
        #[derive(Clone, Copy, Debug)]
        pub struct $point {
            pub(crate) x: $field,
            pub(crate) y: $field,
            pub(crate) z: $field,
        }

        impl Default for $point {
            fn default() -> Self {
                Self::INFINITY
            }
        }

        impl PartialEq for $point {
            fn eq(&self, other: &Self) -> bool {
                bool::from(self.equal(other))
            }
        }

        impl Eq for $point {}

        impl subtle::ConditionallySelectable for $point {
            fn conditional_select(a: &Self, b: &Self, choice: subtle::Choice) -> Self {
                $point {
                    x: subtle::ConditionallySelectable::conditional_select(&a.x, &b.x, choice),
                    y: subtle::ConditionallySelectable::conditional_select(&a.y, &b.y, choice),
                    z: subtle::ConditionallySelectable::conditional_select(&a.z, &b.z, choice),
                }
            }
        }

        impl zeroize::Zeroize for $point {
            fn zeroize(&mut self) {
                zeroize::Zeroize::zeroize(&mut self.x);
                zeroize::Zeroize::zeroize(&mut self.y);
                zeroize::Zeroize::zeroize(&mut self.z);
            }
        }

        impl $point {
            pub const INFINITY: $point = $point { x: <$field>::ZERO, y: <$field>::ONE, z: <$field>::ZERO };

            pub(crate) const fn from_affine(x: $field, y: $field) -> Self {
                $point { x, y, z: <$field>::ONE }
            }

            #[inline]
            pub fn is_infinity(&self) -> subtle::Choice {
                self.z.is_zero()
            }

            /// X1*Z2 == X2*Z1 and Y1*Z2 == Y2*Z1.
            pub fn equal(&self, other: &Self) -> subtle::Choice {
                use subtle::ConstantTimeEq;
                (self.x * other.z).ct_eq(&(other.x * self.z)) & (self.y * other.z).ct_eq(&(other.y * self.z))
            }

            /// Affine coordinates, None for the identity.
            pub fn to_affine(&self) -> Option<($field, $field)> {
                if bool::from(self.is_infinity()) {
                    return None;
                }
                let zinv = ($invert)(self.z);
                Some((self.x * zinv, self.y * zinv))
            }

            pub fn neg(&self) -> Self {
                $point { x: self.x, y: -self.y, z: self.z }
            }

            pub fn add(&self, q: &Self) -> Self {
                let (x1, y1, z1) = (self.x, self.y, self.z);
                let (x2, y2, z2) = (q.x, q.y, q.z);
                let b3 = $b3;

                let mut t0 = x1 * x2;
                let mut t1 = y1 * y2;
                let mut t2 = z1 * z2;
                let t3 = (x1 + y1) * (x2 + y2) - t0 - t1;
                let t4 = (y1 + z1) * (y2 + z2) - t1 - t2;
                let mut y3 = (x1 + z1) * (x2 + z2) - (t0 + t2);
                let mut x3 = t0 + t0;
                t0 = x3 + t0;
                t2 = b3 * t2;
                let mut z3 = t1 + t2;
                t1 = t1 - t2;
                y3 = b3 * y3;
                x3 = t4 * y3;
                t2 = t3 * t1;
                x3 = t2 - x3;
                y3 = y3 * t0;
                t1 = t1 * z3;
                y3 = t1 + y3;
                t0 = t0 * t3;
                z3 = z3 * t4;
                z3 = z3 + t0;
                $point { x: x3, y: y3, z: z3 }
            }

            pub fn double(&self) -> Self {
                let (x, y, z) = (self.x, self.y, self.z);
                let b3 = $b3;

                let mut t0 = y * y;
                let mut z3 = t0 + t0;
                z3 = z3 + z3;
                z3 = z3 + z3;
                let mut t1 = y * z;
                let mut t2 = z * z;
                t2 = b3 * t2;
                let mut x3 = t2 * z3;
                let mut y3 = t0 + t2;
                z3 = t1 * z3;
                t1 = t2 + t2;
                t2 = t1 + t2;
                t0 = t0 - t2;
                y3 = t0 * y3;
                y3 = x3 + y3;
                t1 = x * y;
                x3 = t0 * t1;
                x3 = x3 + x3;
                $point { x: x3, y: y3, z: z3 }
            }

            fn lookup(table: &[$point; 16], idx: u8) -> $point {
                use subtle::{ConditionallySelectable, ConstantTimeEq};
                let mut out = $point::INFINITY;
                for (j, p) in table.iter().enumerate() {
                    out.conditional_assign(p, (j as u8).ct_eq(&idx));
                }
                out
            }

            /// [k]self with a fixed 4-bit window, constant time in k.
            pub fn scalar_mul(&self, k: &$crate::sm9::ec::gfn::GFnElement) -> Self {
                let mut table = [$point::INFINITY; 16];
                for j in 1..16 {
                    table[j] = table[j - 1].add(self);
                }
                let mut acc = $point::INFINITY;
                for b in k.to_be_bytes() {
                    for nibble in [b >> 4, b & 0x0f] {
                        acc = acc.double().double().double().double();
                        acc = acc.add(&Self::lookup(&table, nibble));
                    }
                }
                acc
            }

            /// Row i holds [j * 16^i]self for j in 0..16.
            pub(crate) fn window_table(&self) -> alloc::vec::Vec<[$point; 16]> {
                let mut rows = alloc::vec::Vec::with_capacity(64);
                let mut base = *self;
                for _ in 0..64 {
                    let mut row = [$point::INFINITY; 16];
                    for j in 1..16 {
                        row[j] = row[j - 1].add(&base);
                    }
                    rows.push(row);
                    base = base.double().double().double().double();
                }
                rows
            }

            /// [k]P from the window table of P, no doublings.
            pub(crate) fn mul_with_table(table: &[[$point; 16]], k: &$crate::sm9::ec::gfn::GFnElement) -> Self {
                let bytes = k.to_be_bytes();
                let mut acc = $point::INFINITY;
                for (i, row) in table.iter().enumerate() {
                    let b = bytes[31 - i / 2];
                    let nibble = if i % 2 == 0 { b & 0x0f } else { b >> 4 };
                    acc = acc.add(&Self::lookup(row, nibble));
                }
                acc
            }
        }
    };
}

pub mod gfp;
pub mod gfn;
pub mod gfp2;
pub mod gfp4;
pub mod gfp6;
pub mod gfp12;
pub mod gfp12_b6;
pub mod g1;
pub mod g2;
pub mod gt;
pub mod pairing;
pub mod pairing_b6;
