use std::ops::{Add, AddAssign, Mul, MulAssign, Neg, Sub, SubAssign};

#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Vec2 {
    pub x: f32,
    pub y: f32,
}

impl Vec2 {
    pub const ZERO: Self = Self::splat(0.0);
    pub const ONE: Self = Self::splat(1.0);

    #[inline(always)]
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    #[inline(always)]
    pub const fn splat(value: f32) -> Self {
        Self { x: value, y: value }
    }

    #[inline]
    pub fn length(&self) -> f32 {
        self.x.hypot(self.y)
    }

    #[inline]
    pub fn dot(&self, other: Self) -> f32 {
        self.x * other.x + self.y * other.y
    }

    #[inline]
    pub fn cross(&self, other: Self) -> f32 {
        self.x * other.y - self.y * other.x
    }

    /// v × s, the 2D cross product of a vector with a scalar.
    #[inline]
    pub fn cross_scalar(&self, scalar: f32) -> Self {
        Self {
            x: scalar * self.y,
            y: -scalar * self.x,
        }
    }

    /// s × v, the 2D cross product of a scalar with a vector.
    #[inline]
    pub fn scalar_cross(scalar: f32, vec: Self) -> Self {
        Self {
            x: -scalar * vec.y,
            y: scalar * vec.x,
        }
    }

    #[inline]
    pub fn abs(&self) -> Self {
        Self {
            x: self.x.abs(),
            y: self.y.abs(),
        }
    }

    #[inline]
    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }
}

impl Default for Vec2 {
    #[inline(always)]
    fn default() -> Self {
        Self { x: 0.0, y: 0.0 }
    }
}

impl Add for Vec2 {
    type Output = Self;
    #[inline]
    fn add(self, other: Self) -> Self {
        Self {
            x: self.x + other.x,
            y: self.y + other.y,
        }
    }
}

impl AddAssign for Vec2 {
    #[inline]
    fn add_assign(&mut self, other: Self) {
        self.x += other.x;
        self.y += other.y;
    }
}

impl Neg for Vec2 {
    type Output = Self;
    #[inline]
    fn neg(self) -> Self {
        Self {
            x: -self.x,
            y: -self.y,
        }
    }
}

impl Sub for Vec2 {
    type Output = Self;
    #[inline]
    fn sub(self, other: Self) -> Self {
        Self {
            x: self.x - other.x,
            y: self.y - other.y,
        }
    }
}

impl SubAssign for Vec2 {
    #[inline]
    fn sub_assign(&mut self, other: Self) {
        self.x -= other.x;
        self.y -= other.y;
    }
}

impl Mul<f32> for Vec2 {
    type Output = Self;
    #[inline]
    fn mul(self, other: f32) -> Self {
        Self {
            x: self.x * other,
            y: self.y * other,
        }
    }
}

impl Mul<Vec2> for f32 {
    type Output = Vec2;
    #[inline]
    fn mul(self, other: Vec2) -> Vec2 {
        Vec2 {
            x: self * other.x,
            y: self * other.y,
        }
    }
}

impl MulAssign<f32> for Vec2 {
    #[inline]
    fn mul_assign(&mut self, other: f32) {
        self.x *= other;
        self.y *= other;
    }
}

#[derive(Copy, Clone, Debug)]
pub struct Mat2x2 {
    pub col1: Vec2,
    pub col2: Vec2,
}

impl Mat2x2 {
    pub const ZERO: Mat2x2 = Mat2x2 {
        col1: Vec2::ZERO,
        col2: Vec2::ZERO,
    };

    pub const IDENTITY: Mat2x2 = Mat2x2::from_diag(Vec2::ONE);

    /// Construct from elements in row-major order for visual clarity; the
    /// data is stored in column-major order.
    #[inline(always)]
    pub const fn new(m00: f32, m01: f32, m10: f32, m11: f32) -> Self {
        Self {
            col1: Vec2::new(m00, m10),
            col2: Vec2::new(m01, m11),
        }
    }

    #[inline(always)]
    pub const fn from_cols(col1: Vec2, col2: Vec2) -> Self {
        Self { col1, col2 }
    }

    #[inline(always)]
    pub const fn from_diag(diag: Vec2) -> Self {
        Self {
            col1: Vec2::new(diag.x, 0.0),
            col2: Vec2::new(0.0, diag.y),
        }
    }

    /// Rotation matrix for a counter-clockwise angle in radians.
    #[inline(always)]
    pub fn from_angle(angle: f32) -> Self {
        let c = angle.cos();
        let s = angle.sin();
        Self {
            col1: Vec2::new(c, s),
            col2: Vec2::new(-s, c),
        }
    }

    #[inline]
    pub const fn transpose(&self) -> Self {
        Self {
            col1: Vec2::new(self.col1.x, self.col2.x),
            col2: Vec2::new(self.col1.y, self.col2.y),
        }
    }

    #[inline]
    pub fn determinant(&self) -> f32 {
        self.col1.x * self.col2.y - self.col2.x * self.col1.y
    }

    #[inline]
    pub fn invert(&self) -> Self {
        let inv_det = {
            let det = self.determinant();
            assert!(det != 0.0);
            det.recip()
        };
        Self::new(
            inv_det * self.col2.y,
            -inv_det * self.col2.x,
            -inv_det * self.col1.y,
            inv_det * self.col1.x,
        )
    }

    #[inline]
    pub fn abs(&self) -> Self {
        Self {
            col1: self.col1.abs(),
            col2: self.col2.abs(),
        }
    }
}

impl Add for Mat2x2 {
    type Output = Self;
    #[inline]
    fn add(self, other: Self) -> Self {
        Self {
            col1: self.col1 + other.col1,
            col2: self.col2 + other.col2,
        }
    }
}

impl Mul for Mat2x2 {
    type Output = Self;
    #[inline]
    fn mul(self, other: Self) -> Self {
        Self {
            col1: self * other.col1,
            col2: self * other.col2,
        }
    }
}

impl Mul<Vec2> for Mat2x2 {
    type Output = Vec2;
    #[inline]
    fn mul(self, other: Vec2) -> Vec2 {
        let Mat2x2 {
            col1: row1,
            col2: row2,
        } = self.transpose();
        Vec2::new(row1.dot(other), row2.dot(other))
    }
}

impl Mul<Mat2x2> for f32 {
    type Output = Mat2x2;
    #[inline]
    fn mul(self, other: Mat2x2) -> Mat2x2 {
        Mat2x2 {
            col1: self * other.col1,
            col2: self * other.col2,
        }
    }
}
