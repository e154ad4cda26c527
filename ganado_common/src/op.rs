//! Operator-derivation macros for transparent i64 newtypes.
//!
//! `op!(binary T, Add, add)` implements `Add` for `T` by delegating to the
//! wrapped value; the `inplace` and `unary` arms cover the assignment and
//! negation flavours.

#[macro_export]
macro_rules! op {
    (binary $ty:ty, $trait:ident, $method:ident) => {
        impl std::ops::$trait for $ty {
            type Output = Self;

            fn $method(self, rhs: Self) -> Self::Output {
                Self::from(std::ops::$trait::$method(self.value(), rhs.value()))
            }
        }
    };
    (inplace $ty:ty, AddAssign, add_assign) => {
        impl std::ops::AddAssign for $ty {
            fn add_assign(&mut self, rhs: Self) {
                *self = Self::from(self.value() + rhs.value());
            }
        }
    };
    (inplace $ty:ty, SubAssign, sub_assign) => {
        impl std::ops::SubAssign for $ty {
            fn sub_assign(&mut self, rhs: Self) {
                *self = Self::from(self.value() - rhs.value());
            }
        }
    };
    (unary $ty:ty, $trait:ident, $method:ident) => {
        impl std::ops::$trait for $ty {
            type Output = Self;

            fn $method(self) -> Self::Output {
                Self::from(std::ops::$trait::$method(self.value()))
            }
        }
    };
}
