//! The closed set of functions a formula may call.
//!
//! All functions operate on `Complex<f64>` so that domain excursions such as
//! `sqrt(-1)` produce a complex intermediate instead of aborting. Functions
//! with no meaningful complex extension (ordering, rounding) act on the real
//! part and return a real value.

use num_complex::Complex64;
use std::fmt;

/// A built-in function.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Function {
    /// Sine
    Sin,
    /// Cosine
    Cos,
    /// Tangent
    Tan,
    /// Arcsine (principal branch)
    Asin,
    /// Arccosine (principal branch)
    Acos,
    /// Arctangent
    Atan,
    /// Hyperbolic sine
    Sinh,
    /// Hyperbolic cosine
    Cosh,
    /// Hyperbolic tangent
    Tanh,
    /// Principal square root
    Sqrt,
    /// Natural exponential
    Exp,
    /// Natural logarithm (principal branch)
    Ln,
    /// Base-10 logarithm
    Log,
    /// Complex modulus
    Abs,
    /// Floor of the real part
    Floor,
    /// Ceiling of the real part
    Ceil,
    /// Real part rounded half away from zero
    Round,
    /// Sign of the real part (`-1`, `0`, `1`)
    Sign,
    /// Smaller real part
    Min,
    /// Larger real part
    Max,
    /// Power, same as `^`
    Pow,
    /// Two-argument arctangent of the real parts, `atan2(y, x)`
    Atan2,
    /// `clamp(value, lo, hi)` on real parts
    Clamp,
}

const ALL: [Function; 23] = [
    Function::Sin,
    Function::Cos,
    Function::Tan,
    Function::Asin,
    Function::Acos,
    Function::Atan,
    Function::Sinh,
    Function::Cosh,
    Function::Tanh,
    Function::Sqrt,
    Function::Exp,
    Function::Ln,
    Function::Log,
    Function::Abs,
    Function::Floor,
    Function::Ceil,
    Function::Round,
    Function::Sign,
    Function::Min,
    Function::Max,
    Function::Pow,
    Function::Atan2,
    Function::Clamp,
];

impl Function {
    /// Look up a function by the name used in formula text.
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        ALL.iter().copied().find(|f| f.name() == name)
    }

    /// Every supported function.
    #[must_use]
    pub fn all() -> &'static [Function] {
        &ALL
    }

    /// Name as written in formula text.
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Function::Sin => "sin",
            Function::Cos => "cos",
            Function::Tan => "tan",
            Function::Asin => "asin",
            Function::Acos => "acos",
            Function::Atan => "atan",
            Function::Sinh => "sinh",
            Function::Cosh => "cosh",
            Function::Tanh => "tanh",
            Function::Sqrt => "sqrt",
            Function::Exp => "exp",
            Function::Ln => "ln",
            Function::Log => "log",
            Function::Abs => "abs",
            Function::Floor => "floor",
            Function::Ceil => "ceil",
            Function::Round => "round",
            Function::Sign => "sign",
            Function::Min => "min",
            Function::Max => "max",
            Function::Pow => "pow",
            Function::Atan2 => "atan2",
            Function::Clamp => "clamp",
        }
    }

    /// Number of arguments the function takes.
    #[must_use]
    pub fn arity(self) -> usize {
        match self {
            Function::Min | Function::Max | Function::Pow | Function::Atan2 => 2,
            Function::Clamp => 3,
            _ => 1,
        }
    }

    /// Apply the function to `args`.
    ///
    /// `args` must hold exactly [`arity`](Self::arity) values; missing
    /// arguments read as NaN so a malformed call can never panic.
    #[must_use]
    pub fn apply(self, args: &[Complex64]) -> Complex64 {
        let nan = Complex64::new(f64::NAN, 0.0);
        let a = args.first().copied().unwrap_or(nan);
        let b = args.get(1).copied().unwrap_or(nan);
        match self {
            Function::Sin => a.sin(),
            Function::Cos => a.cos(),
            Function::Tan => a.tan(),
            Function::Asin => asin(a),
            Function::Acos => acos(a),
            Function::Atan => a.atan(),
            Function::Sinh => a.sinh(),
            Function::Cosh => a.cosh(),
            Function::Tanh => a.tanh(),
            Function::Sqrt => sqrt(a),
            Function::Exp => a.exp(),
            Function::Ln => ln(a),
            Function::Log => ln(a) / std::f64::consts::LN_10,
            Function::Abs => real(a.norm()),
            Function::Floor => real(a.re.floor()),
            Function::Ceil => real(a.re.ceil()),
            Function::Round => real(a.re.round()),
            Function::Sign => real(sign(a.re)),
            Function::Min => real(a.re.min(b.re)),
            Function::Max => real(a.re.max(b.re)),
            Function::Pow => pow(a, b),
            Function::Atan2 => real(a.re.atan2(b.re)),
            Function::Clamp => {
                let c = args.get(2).copied().unwrap_or(nan);
                real(a.re.max(b.re).min(c.re))
            }
        }
    }
}

impl fmt::Display for Function {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

fn real(value: f64) -> Complex64 {
    Complex64::new(value, 0.0)
}

fn sign(value: f64) -> f64 {
    if value > 0.0 {
        1.0
    } else if value < 0.0 {
        -1.0
    } else {
        value
    }
}

/// Principal square root. Real inputs take the fast path; a negative real
/// yields a purely imaginary result.
fn sqrt(a: Complex64) -> Complex64 {
    if a.im == 0.0 && a.re >= 0.0 {
        real(a.re.sqrt())
    } else {
        a.sqrt()
    }
}

fn ln(a: Complex64) -> Complex64 {
    if a.im == 0.0 && a.re > 0.0 {
        real(a.re.ln())
    } else {
        a.ln()
    }
}

fn asin(a: Complex64) -> Complex64 {
    if a.im == 0.0 && (-1.0..=1.0).contains(&a.re) {
        real(a.re.asin())
    } else {
        a.asin()
    }
}

fn acos(a: Complex64) -> Complex64 {
    if a.im == 0.0 && (-1.0..=1.0).contains(&a.re) {
        real(a.re.acos())
    } else {
        a.acos()
    }
}

/// `base ^ exponent` on the principal branch.
///
/// Real bases with integral exponents, and non-negative real bases, stay on
/// the real path so results like `(-2)^3` are exact.
pub(crate) fn pow(base: Complex64, exponent: Complex64) -> Complex64 {
    if base.im == 0.0 && exponent.im == 0.0 {
        let (b, e) = (base.re, exponent.re);
        if b >= 0.0 || e.fract() == 0.0 || !b.is_finite() || !e.is_finite() {
            return real(b.powf(e));
        }
    }
    if base == Complex64::new(0.0, 0.0) {
        return if exponent.re > 0.0 {
            base
        } else {
            real(f64::INFINITY)
        };
    }
    base.powc(exponent)
}
