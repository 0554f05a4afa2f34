use std::fmt;

/// The two classes an online binary classifier tells apart.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Label {
    Positive,
    Negative,
}

impl Label {
    /// Maps a signed label into a class, anything not strictly positive is negative.
    pub fn from_sign(sign: i8) -> Self {
        if sign > 0 {
            Label::Positive
        } else {
            Label::Negative
        }
    }

    /// Returns the label as `+1` or `-1`.
    pub fn as_i8(self) -> i8 {
        match self {
            Label::Positive => 1,
            Label::Negative => -1,
        }
    }

    pub(crate) fn sign(self) -> f64 {
        f64::from(self.as_i8())
    }
}

impl fmt::Display for Label {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_i8())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_is_the_negative_class() {
        assert_eq!(Label::from_sign(0), Label::Negative);
        assert_eq!(Label::from_sign(-1), Label::Negative);
        assert_eq!(Label::from_sign(1), Label::Positive);
        assert_eq!(Label::from_sign(0).as_i8(), -1);
    }
}
