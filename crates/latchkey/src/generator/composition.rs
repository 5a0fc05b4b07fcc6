use crate::GenerationError;
use rand::{CryptoRng, Rng, seq::SliceRandom};

const LOWERCASE: &[u8] = b"abcdefghijklmnopqrstuvwxyz";
const UPPERCASE: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ";
const DIGITS: &[u8] = b"0123456789";
// Printable ASCII minus quotes, backslash, slash, colon, comma, semicolon,
// pipe, brackets of any kind and whitespace. Several of the remaining symbols
// are query-string delimiters or shell metacharacters, so identifiers must
// still be percent-encoded in URLs and quoted in shells.
const SYMBOLS: &[u8] = b"!#$%&*+-.=?@^_~";

/// A class of characters an identifier can be composed from.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum CharClass {
    Lowercase,
    Uppercase,
    Digit,
    Symbol,
}

impl CharClass {
    /// All classes, in composition order.
    pub const ALL: [Self; 4] = [Self::Lowercase, Self::Uppercase, Self::Digit, Self::Symbol];

    /// The ASCII characters belonging to this class.
    pub const fn alphabet(self) -> &'static [u8] {
        match self {
            Self::Lowercase => LOWERCASE,
            Self::Uppercase => UPPERCASE,
            Self::Digit => DIGITS,
            Self::Symbol => SYMBOLS,
        }
    }

    /// Returns `true` if `c` belongs to this class.
    pub fn contains(self, c: char) -> bool {
        c.is_ascii() && self.alphabet().contains(&(c as u8))
    }
}

/// Shape of a generated identifier: a minimum count per [`CharClass`] and the
/// total length.
///
/// The minimums are part of `length`. The remaining characters are drawn from
/// the union of the classes that have a non-zero minimum, or from every class
/// when all minimums are zero.
///
/// # Example
///
/// ```
/// use latchkey::Composition;
///
/// let policy = Composition::new(2, 2, 2, 0, 16);
/// assert!(policy.validate().is_ok());
/// assert!(Composition::new(8, 8, 8, 8, 16).validate().is_err());
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Composition {
    pub lowercase: usize,
    pub uppercase: usize,
    pub digits: usize,
    pub symbols: usize,
    pub length: usize,
}

impl Default for Composition {
    /// Four characters of every class in a 64 character identifier.
    fn default() -> Self {
        Self::new(4, 4, 4, 4, 64)
    }
}

impl Composition {
    pub const fn new(
        lowercase: usize,
        uppercase: usize,
        digits: usize,
        symbols: usize,
        length: usize,
    ) -> Self {
        Self {
            lowercase,
            uppercase,
            digits,
            symbols,
            length,
        }
    }

    /// The minimum count requested for `class`.
    pub const fn minimum(&self, class: CharClass) -> usize {
        match class {
            CharClass::Lowercase => self.lowercase,
            CharClass::Uppercase => self.uppercase,
            CharClass::Digit => self.digits,
            CharClass::Symbol => self.symbols,
        }
    }

    /// Sum of all class minimums, saturating on overflow.
    pub fn required(&self) -> usize {
        CharClass::ALL
            .iter()
            .fold(0usize, |acc, class| acc.saturating_add(self.minimum(*class)))
    }

    /// Checks that an identifier with this shape can be produced.
    ///
    /// # Errors
    ///
    /// - [`GenerationError::EmptyLength`] if `length` is zero.
    /// - [`GenerationError::Infeasible`] if the minimums exceed `length`.
    pub fn validate(&self) -> Result<(), GenerationError> {
        if self.length == 0 {
            return Err(GenerationError::EmptyLength);
        }
        let required = self.required();
        if required > self.length {
            return Err(GenerationError::Infeasible {
                required,
                length: self.length,
            });
        }
        Ok(())
    }

    fn fill_alphabet(&self) -> Vec<u8> {
        let enabled: Vec<CharClass> = CharClass::ALL
            .into_iter()
            .filter(|class| self.minimum(*class) > 0)
            .collect();
        let classes: &[CharClass] = if enabled.is_empty() {
            &CharClass::ALL
        } else {
            &enabled
        };
        classes
            .iter()
            .flat_map(|class| class.alphabet().iter().copied())
            .collect()
    }
}

/// Builds an identifier matching `composition` from a cryptographically
/// secure RNG.
///
/// Class minimums are drawn first, the remainder is filled, and the result is
/// shuffled so class positions carry no information.
///
/// # Errors
///
/// Returns the [`GenerationError`] from [`Composition::validate`]. There is no
/// fallback to a weaker identifier.
pub fn compose<R>(rng: &mut R, composition: &Composition) -> Result<String, GenerationError>
where
    R: Rng + CryptoRng,
{
    composition.validate()?;

    let mut out = Vec::with_capacity(composition.length);
    for class in CharClass::ALL {
        let alphabet = class.alphabet();
        for _ in 0..composition.minimum(class) {
            out.push(alphabet[rng.random_range(0..alphabet.len())]);
        }
    }

    let fill = composition.fill_alphabet();
    while out.len() < composition.length {
        out.push(fill[rng.random_range(0..fill.len())]);
    }

    out.shuffle(rng);
    Ok(out.into_iter().map(char::from).collect())
}
