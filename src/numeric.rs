//!
//! Real number representation used by generated code
//!
use crate::error::{CompileError, ErrorKind};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

///
/// `double` (plain), `bfloat` (extended exponent) or `logspace` (stored as
/// logarithm). The latter two are C++ classes overloading `+ * < ==`, so
/// every expression is written with the same operators; only literals and
/// conversions differ.
///
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Numeric {
    Double,
    BFloat,
    LogSpace,
}

impl Default for Numeric {
    fn default() -> Self {
        Numeric::Double
    }
}

impl Numeric {
    ///
    /// C++ type behind `_extreal_`
    ///
    pub fn real_type(&self) -> &'static str {
        match self {
            Numeric::Double => "double",
            Numeric::BFloat => "bfloat",
            Numeric::LogSpace => "logspace",
        }
    }
    ///
    /// header providing the type, if any
    ///
    pub fn include(&self) -> Option<&'static str> {
        match self {
            Numeric::Double => None,
            Numeric::BFloat => Some("bfloat.h"),
            Numeric::LogSpace => Some("logspace.h"),
        }
    }
    ///
    /// Convert a caller-supplied probability expression into `_extreal_`.
    ///
    pub fn wrap(&self, expr: &str) -> String {
        match self {
            Numeric::Double => expr.to_string(),
            _ => format!("_extreal_({})", expr),
        }
    }
    pub fn zero(&self) -> &'static str {
        match self {
            Numeric::Double => "0.0",
            _ => "_extreal_(0.0)",
        }
    }
    pub fn one(&self) -> &'static str {
        match self {
            Numeric::Double => "1.0",
            _ => "_extreal_(1.0)",
        }
    }
}

impl fmt::Display for Numeric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.real_type())
    }
}

impl FromStr for Numeric {
    type Err = CompileError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "double" => Ok(Numeric::Double),
            "bfloat" => Ok(Numeric::BFloat),
            "logspace" => Ok(Numeric::LogSpace),
            _ => Err(ErrorKind::UnknownNumeric(s.to_string()).into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_and_render() {
        assert_eq!("bfloat".parse::<Numeric>().unwrap(), Numeric::BFloat);
        assert_eq!(Numeric::LogSpace.to_string(), "logspace");
        let e = "float".parse::<Numeric>().unwrap_err();
        assert_eq!(e.kind(), &ErrorKind::UnknownNumeric("float".to_string()));
        assert_eq!(Numeric::Double.wrap("0.5"), "0.5");
        assert_eq!(Numeric::BFloat.wrap("p[a]"), "_extreal_(p[a])");
        let n: Numeric = serde_json::from_str("\"logspace\"").unwrap();
        assert_eq!(n, Numeric::LogSpace);
    }
}
