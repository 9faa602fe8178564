use alloc::vec::Vec;
use core::fmt::Display;

use subtle::{Choice, ConditionallyNegatable, ConditionallySelectable, ConstantTimeEq};
use zeroize::Zeroize;

use crate::internal::Lazy;
use crate::sm2::error::{Result, SM2Error};

use super::gfn::GFnElement;
use super::gfp::*;
use super::*;

/// The form used when encoding a point.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum PointForm {
    #[default]
    Uncompressed,
    Compressed,
    Hybrid,
}

/// Affine point in Montgomery representation.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct AffinePoint {
    pub x: GFpElement,
    pub y: GFpElement,
    pub infinity: bool,
}

impl Default for AffinePoint {
    fn default() -> Self {
        Self::INFINITY
    }
}

// Montgomery representation of b.
const B: GFpElement = GFpElement {
    limbs: [0x90d230632bc0dd42, 0x71cf379ae9b537ab, 0x527981505ea51c3c, 0x240fe188ba20e2c8],
};

impl AffinePoint {
    pub const INFINITY: AffinePoint = AffinePoint {
        x: GFpElement { limbs: [0, 0, 0, 0] },
        y: GFpElement { limbs: [0, 0, 0, 0] },
        infinity: true,
    };

    // The base point G in montgomery representation.
    pub const BASE: AffinePoint = AffinePoint {
        x: GFpElement {
            limbs: [0x61328990f418029e, 0x3e7981eddca6c050, 0xd6a1ed99ac24c3c3, 0x91167a5ee1c13b05],
        },
        y: GFpElement {
            limbs: [0xc1354e593c2d0ddd, 0xc1f5e5788d3295fa, 0x8d4cfb066e2a48f8, 0x63cd65d481d735bd],
        },
        infinity: false,
    };

    pub fn new_from_scalar_base_mul(scalar: &[u64; 4]) -> AffinePoint {
        ProjectivePoint::new_from_scalar_base_mul(scalar).to_affine()
    }

    pub fn equal(&self, other: &AffinePoint) -> bool {
        if self.infinity || other.infinity {
            return self.infinity == other.infinity;
        }
        self.x == other.x && self.y == other.y
    }

    /// Returns true if y^2 = x^3 - 3x + b.
    pub fn is_on_curve(&self) -> bool {
        if self.infinity {
            return false;
        }
        let y2 = GFpElement::new_from_square(&self.y);
        y2 == rhs(&self.x)
    }

    pub fn scalar_mul(&self, scalar: &[u64; 4]) -> AffinePoint {
        ProjectivePoint::from(self).scalar_mul(scalar).to_affine()
    }

    pub fn neg(&self) -> AffinePoint {
        AffinePoint { x: self.x, y: self.y.neg_move(), infinity: self.infinity }
    }

    /// The canonical big-endian x coordinate.
    pub fn x_bytes(&self) -> [u8; 32] {
        self.x.to_be_bytes()
    }

    /// The canonical big-endian y coordinate.
    pub fn y_bytes(&self) -> [u8; 32] {
        self.y.to_be_bytes()
    }

    pub fn to_bytes(&self, form: PointForm) -> Vec<u8> {
        if self.infinity {
            return vec![0];
        }
        let odd = bool::from(self.y.is_odd()) as u8;
        let mut out = Vec::with_capacity(65);
        match form {
            PointForm::Uncompressed => {
                out.push(0x04);
                out.extend_from_slice(&self.x_bytes());
                out.extend_from_slice(&self.y_bytes());
            }
            PointForm::Compressed => {
                out.push(0x02 | odd);
                out.extend_from_slice(&self.x_bytes());
            }
            PointForm::Hybrid => {
                out.push(0x06 | odd);
                out.extend_from_slice(&self.x_bytes());
                out.extend_from_slice(&self.y_bytes());
            }
        }
        out
    }

    /// Decodes 0x00, 0x02/0x03, 0x04 and 0x06/0x07 encodings.
    pub fn from_bytes(b: &[u8]) -> Result<AffinePoint> {
        let Some(&tag) = b.first() else {
            return Err(SM2Error::InvalidLength);
        };
        match tag {
            0x00 => {
                if b.len() != 1 {
                    return Err(SM2Error::InvalidLength);
                }
                Ok(AffinePoint::INFINITY)
            }
            0x02 | 0x03 => {
                if b.len() != 33 {
                    return Err(SM2Error::InvalidLength);
                }
                let x = parse_coordinate(&b[1..33])?;
                Self::decompress(&x, tag & 1)
            }
            0x04 | 0x06 | 0x07 => {
                if b.len() != 65 {
                    return Err(SM2Error::InvalidLength);
                }
                let x = parse_coordinate(&b[1..33])?;
                let y = parse_coordinate(&b[33..65])?;
                let p = AffinePoint { x, y, infinity: false };
                if !p.is_on_curve() {
                    return Err(SM2Error::InvalidPoint);
                }
                if tag != 0x04 && bool::from(y.is_odd()) as u8 != tag & 1 {
                    return Err(SM2Error::InvalidPoint);
                }
                Ok(p)
            }
            _ => Err(SM2Error::InvalidEncoding),
        }
    }

    /// Recovers the point with the given x and parity of y.
    pub fn decompress(x: &GFpElement, odd: u8) -> Result<AffinePoint> {
        let Some(mut y) = GFpElement::sqrt(&rhs(x)) else {
            return Err(SM2Error::InvalidPoint);
        };
        let neg = y.neg_move();
        let flip = y.is_odd() ^ Choice::from(odd & 1);
        y.conditional_assign(&neg, flip);
        Ok(AffinePoint { x: *x, y, infinity: false })
    }
}

// x^3 - 3x + b
fn rhs(x: &GFpElement) -> GFpElement {
    let x3 = GFpElement::new_from_square(x).mul_move(x);
    let three_x = GFpElement::new_from_double(x).add_move(x);
    x3.sub_move(&three_x).add_move(&B)
}

fn parse_coordinate(b: &[u8]) -> Result<GFpElement> {
    let b: &[u8; 32] = b.try_into().map_err(|_| SM2Error::InvalidLength)?;
    GFpElement::from_be_bytes(b).ok_or(SM2Error::InvalidPoint)
}

// Leaves the point at infinity.
impl Zeroize for AffinePoint {
    fn zeroize(&mut self) {
        self.x.zeroize();
        self.y.zeroize();
        self.infinity = true;
    }
}

impl ConditionallySelectable for AffinePoint {
    fn conditional_select(a: &Self, b: &Self, choice: Choice) -> Self {
        AffinePoint {
            x: GFpElement::conditional_select(&a.x, &b.x, choice),
            y: GFpElement::conditional_select(&a.y, &b.y, choice),
            infinity: a.infinity,
        }
    }
}

impl From<&ProjectivePoint> for AffinePoint {
    fn from(p: &ProjectivePoint) -> Self {
        p.to_affine()
    }
}

impl From<ProjectivePoint> for AffinePoint {
    fn from(p: ProjectivePoint) -> Self {
        p.to_affine()
    }
}

/// Projective point (X:Y:Z), x = X/Z, y = Y/Z. The infinity is (0:1:0).
#[derive(Clone, Copy, Debug)]
pub struct ProjectivePoint {
    pub x: GFpElement,
    pub y: GFpElement,
    pub z: GFpElement,
}

impl Default for ProjectivePoint {
    fn default() -> Self {
        Self::INFINITY
    }
}

impl From<&AffinePoint> for ProjectivePoint {
    fn from(value: &AffinePoint) -> Self {
        ProjectivePoint::from_affine(value)
    }
}

impl From<AffinePoint> for ProjectivePoint {
    fn from(value: AffinePoint) -> Self {
        ProjectivePoint::from_affine(&value)
    }
}

impl Display for ProjectivePoint {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "x: {}\ny: {}\nz: {}\n", self.x, self.y, self.z)
    }
}

impl ConditionallySelectable for ProjectivePoint {
    fn conditional_select(a: &Self, b: &Self, choice: Choice) -> Self {
        ProjectivePoint {
            x: GFpElement::conditional_select(&a.x, &b.x, choice),
            y: GFpElement::conditional_select(&a.y, &b.y, choice),
            z: GFpElement::conditional_select(&a.z, &b.z, choice),
        }
    }
}

// Rows of the comb table: row i holds [(j+1) * 2^(6i)]G for j in 0..32.
const COMB_ROWS: usize = 43;
const COMB_COLS: usize = 32;

static BASE_TABLE: Lazy<Vec<[AffinePoint; COMB_COLS]>> = Lazy::new(init_base_table);

fn init_base_table() -> Vec<[AffinePoint; COMB_COLS]> {
    let mut table = Vec::with_capacity(COMB_ROWS);
    let mut base = ProjectivePoint::BASE;
    for _ in 0..COMB_ROWS {
        let mut row = [AffinePoint::INFINITY; COMB_COLS];
        let mut acc = base;
        for entry in row.iter_mut() {
            *entry = acc.to_affine();
            acc.add(&base);
        }
        table.push(row);
        for _ in 0..6 {
            base.double();
        }
    }
    tracing::debug!(rows = COMB_ROWS, cols = COMB_COLS, "sm2 base point table initialised");
    table
}

/// Returns the `width`-bit window of k starting at bit idx, idx = -1 shifts in a zero bit.
#[inline]
fn window(k: &[LIMB; 4], idx: isize, width: usize) -> u64 {
    let mask = (1u64 << width) - 1;
    if idx < 0 {
        return (k[0] << 1) & mask;
    }
    let (limb, off) = (idx as usize / 64, idx as usize % 64);
    let mut w = k[limb] >> off;
    if off + width > 64 && limb + 1 < 4 {
        w |= k[limb + 1] << (64 - off);
    }
    w & mask
}

/// Booth recoding of a (W+1)-bit window. Returns (|digit|, sign).
#[inline]
pub(crate) fn booth<const W: usize>(input: u64) -> (u64, u64) {
    let s = !((input >> W).wrapping_sub(1));
    let d = (1u64 << (W + 1)).wrapping_sub(input).wrapping_sub(1);
    let d = (d & s) | (input & !s);
    let d = (d >> 1) + (d & 1);
    (d, s & 1)
}

/// Constant-time lookup of table[sel-1]; returns `init` if sel == 0.
fn select_affine(row: &[AffinePoint; COMB_COLS], sel: u64) -> AffinePoint {
    let mut out = AffinePoint { x: GFpElement::ZERO, y: GFpElement::ZERO, infinity: false };
    for (j, p) in row.iter().enumerate() {
        out.conditional_assign(p, (j as u64 + 1).ct_eq(&sel));
    }
    out
}

fn select_projective(table: &[ProjectivePoint; 16], sel: u64) -> ProjectivePoint {
    let mut out = ProjectivePoint::INFINITY;
    for (j, p) in table.iter().enumerate() {
        out.conditional_assign(p, (j as u64 + 1).ct_eq(&sel));
    }
    out
}

/// Reduces a 256-bit scalar into [0, n).
#[inline]
fn reduce_scalar(scalar: &[u64; 4]) -> [LIMB; 4] {
    let mut k = GFnElement { limbs: *scalar };
    k.add_zero();
    k.limbs
}

impl ProjectivePoint {
    pub const INFINITY: ProjectivePoint = ProjectivePoint {
        x: GFpElement::ZERO,
        y: GFpElement::R,
        z: GFpElement::ZERO,
    };

    pub const BASE: ProjectivePoint = ProjectivePoint {
        x: AffinePoint::BASE.x,
        y: AffinePoint::BASE.y,
        z: GFpElement::R,
    };

    #[inline]
    pub fn is_infinity(&self) -> Choice {
        self.z.is_zero()
    }

    pub const fn from_affine(p: &AffinePoint) -> Self {
        match p.infinity {
            true => ProjectivePoint::INFINITY,
            false => ProjectivePoint { x: p.x, y: p.y, z: GFpElement::R },
        }
    }

    /// Converts to affine coordinates, x = X/Z and y = Y/Z.
    pub fn to_affine(&self) -> AffinePoint {
        if bool::from(self.is_infinity()) {
            return AffinePoint::INFINITY;
        }
        let zinv = GFpElement::new_from_invert(&self.z);
        AffinePoint {
            x: GFpElement::new_from_mul(&self.x, &zinv),
            y: GFpElement::new_from_mul(&self.y, &zinv),
            infinity: false,
        }
    }

    /// Returns the affine x coordinate, or None for the infinity.
    pub fn get_affine_x(&self) -> Option<GFpElement> {
        match bool::from(self.is_infinity()) {
            true => None,
            false => Some(GFpElement::new_from_invert(&self.z).mul_move(&self.x)),
        }
    }

    /// Projective equality: X1*Z2 == X2*Z1 and Y1*Z2 == Y2*Z1.
    pub fn equal(&self, other: &ProjectivePoint) -> Choice {
        let inf1 = self.is_infinity();
        let inf2 = other.is_infinity();
        let x1 = GFpElement::new_from_mul(&self.x, &other.z);
        let x2 = GFpElement::new_from_mul(&other.x, &self.z);
        let y1 = GFpElement::new_from_mul(&self.y, &other.z);
        let y2 = GFpElement::new_from_mul(&other.y, &self.z);
        (inf1 & inf2) | (!inf1 & !inf2 & x1.ct_eq(&x2) & y1.ct_eq(&y2))
    }

    pub fn neg(&mut self) -> &mut Self {
        self.y.neg();
        self
    }

    /// self = self + q, complete addition for a = -3 (RCB15, algorithm 4).
    pub fn add(&mut self, q: &ProjectivePoint) -> &mut Self {
        let (x1, y1, z1) = (&self.x, &self.y, &self.z);
        let (x2, y2, z2) = (&q.x, &q.y, &q.z);

        let mut t0 = GFpElement::new_from_mul(x1, x2);
        let mut t1 = GFpElement::new_from_mul(y1, y2);
        let mut t2 = GFpElement::new_from_mul(z1, z2);
        let mut t3 = GFpElement::new_from_add(x1, y1);
        let mut t4 = GFpElement::new_from_add(x2, y2);
        t3.mul(&t4);
        t4.from_add(&t0, &t1);
        t3.sub(&t4);
        t4.from_add(y1, z1);
        let mut x3 = GFpElement::new_from_add(y2, z2);
        t4.mul(&x3);
        x3.from_add(&t1, &t2);
        t4.sub(&x3);
        x3.from_add(x1, z1);
        let mut y3 = GFpElement::new_from_add(x2, z2);
        x3.mul(&y3);
        let t5 = GFpElement::new_from_add(&t0, &t2);
        y3.from_sub(&x3, &t5);
        let mut z3 = GFpElement::new_from_mul(&B, &t2);
        x3.from_sub(&y3, &z3);
        z3.from_double(&x3);
        x3.add(&z3);
        z3.from_sub(&t1, &x3);
        x3.add(&t1);
        y3.mul(&B);
        t1.from_double(&t2);
        t2.add(&t1);
        y3.sub(&t2).sub(&t0);
        t1.from_double(&y3);
        y3.add(&t1);
        t1.from_double(&t0);
        t0.add(&t1).sub(&t2);
        t1.from_mul(&t4, &y3);
        t2.from_mul(&t0, &y3);
        y3.from_mul(&x3, &z3).add(&t2);
        x3.mul(&t3).sub(&t1);
        z3.mul(&t4);
        t1.from_mul(&t3, &t0);
        z3.add(&t1);

        (self.x, self.y, self.z) = (x3, y3, z3);
        self
    }

    /// self = self + q for an affine q != infinity (RCB15, algorithm 5).
    pub fn add_mixed(&mut self, q: &AffinePoint) -> &mut Self {
        let (x1, y1, z1) = (&self.x, &self.y, &self.z);
        let (x2, y2) = (&q.x, &q.y);

        let mut t0 = GFpElement::new_from_mul(x1, x2);
        let mut t1 = GFpElement::new_from_mul(y1, y2);
        let mut t3 = GFpElement::new_from_add(x2, y2);
        let mut t4 = GFpElement::new_from_add(x1, y1);
        t3.mul(&t4);
        t4.from_add(&t0, &t1);
        t3.sub(&t4);
        t4.from_mul(y2, z1).add(y1);
        let mut y3 = GFpElement::new_from_mul(x2, z1);
        y3.add(x1);
        let mut z3 = GFpElement::new_from_mul(&B, z1);
        let mut x3 = GFpElement::new_from_sub(&y3, &z3);
        z3.from_double(&x3);
        x3.add(&z3);
        z3.from_sub(&t1, &x3);
        x3.add(&t1);
        y3.mul(&B);
        t1.from_double(z1);
        let mut t2 = GFpElement::new_from_add(&t1, z1);
        y3.sub(&t2).sub(&t0);
        t1.from_double(&y3);
        y3.add(&t1);
        t1.from_double(&t0);
        t0.add(&t1).sub(&t2);
        t1.from_mul(&t4, &y3);
        t2.from_mul(&t0, &y3);
        y3.from_mul(&x3, &z3).add(&t2);
        x3.mul(&t3).sub(&t1);
        z3.mul(&t4);
        t1.from_mul(&t3, &t0);
        z3.add(&t1);

        (self.x, self.y, self.z) = (x3, y3, z3);
        self
    }

    /// self = 2*self (RCB15, algorithm 6).
    pub fn double(&mut self) -> &mut Self {
        let (x, y, z) = (&self.x, &self.y, &self.z);

        let mut t0 = GFpElement::new_from_square(x);
        let t1 = GFpElement::new_from_square(y);
        let mut t2 = GFpElement::new_from_square(z);
        let mut t3 = GFpElement::new_from_mul(x, y);
        t3.double();
        let mut z3 = GFpElement::new_from_mul(x, z);
        z3.double();
        let mut y3 = GFpElement::new_from_mul(&B, &t2);
        y3.sub(&z3);
        let mut x3 = GFpElement::new_from_double(&y3);
        y3.add(&x3);
        x3.from_sub(&t1, &y3);
        y3.add(&t1);
        y3.mul(&x3);
        x3.mul(&t3);
        t2.triple();
        z3.mul(&B).sub(&t2).sub(&t0);
        z3.triple();
        t0.triple().sub(&t2);
        t0.mul(&z3);
        y3.add(&t0);
        t0.from_mul(y, z).double();
        z3.mul(&t0);
        x3.sub(&z3);
        z3.from_mul(&t0, &t1).double().double();

        (self.x, self.y, self.z) = (x3, y3, z3);
        self
    }

    /// Returns [k]G using the comb table. k is reduced modulo n first.
    pub fn new_from_scalar_base_mul(scalar: &[u64; 4]) -> Self {
        let k = reduce_scalar(scalar);
        let table = &*BASE_TABLE;
        let mut p = ProjectivePoint::INFINITY;
        for (i, row) in table.iter().enumerate() {
            let w = window(&k, 6 * i as isize - 1, 7);
            let (sel, sign) = booth::<6>(w);
            let mut t = select_affine(row, sel);
            t.y.conditional_negate(Choice::from(sign as u8));
            let mut q = p;
            q.add_mixed(&t);
            p.conditional_assign(&q, !sel.ct_eq(&0));
        }
        p
    }

    /// Returns [k]self with a 5-bit Booth window. k is reduced modulo n first.
    pub fn scalar_mul(&self, scalar: &[u64; 4]) -> Self {
        let k = reduce_scalar(scalar);
        let mut table = [ProjectivePoint::INFINITY; 16];
        table[0] = *self;
        for j in 1..16 {
            table[j] = table[j - 1];
            table[j].add(self);
        }

        let mut p = ProjectivePoint::INFINITY;
        let mut idx: isize = 254;
        let mut first = true;
        loop {
            let (sel, sign) = booth::<5>(window(&k, idx, 6));
            if !first {
                for _ in 0..5 {
                    p.double();
                }
            }
            first = false;
            let mut t = select_projective(&table, sel);
            t.y.conditional_negate(Choice::from(sign as u8));
            p.add(&t);
            if idx < 0 {
                break;
            }
            idx = if idx >= 5 { idx - 5 } else { -1 };
        }
        p
    }

    /// Returns [a]G + [b]q.
    pub fn new_from_double_scalar_mul(a: &[u64; 4], b: &[u64; 4], q: &ProjectivePoint) -> Self {
        let mut p = Self::new_from_scalar_base_mul(a);
        p.add(&q.scalar_mul(b));
        p
    }
}
