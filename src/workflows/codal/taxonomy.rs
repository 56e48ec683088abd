use super::domain::LetterCode;
use std::collections::HashSet;

const STANDARD_CODES: [&str; 12] = [
    "ن-۶۰", "ن-۶۱", "ن-۶۳", "ن-۶۲", "ن-۷۱", "ن-۷۲", "ن-۵۶", "ن-۷۳", "ن-۶۴", "ن-۶۵", "ن-۶۶", "ن-۶۷",
];

const STANDARD_EXEMPT: [&str; 2] = ["ن-۶۰", "ن-۶۱"];

/// Ordered walk of report types used to rebuild a filing's history.
///
/// Exempt codes are accepted as historical entries without a DPM comparison.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LetterCodeTaxonomy {
    codes: Vec<LetterCode>,
    exempt: HashSet<LetterCode>,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TaxonomyError {
    #[error("letter-code taxonomy must contain at least one code")]
    Empty,
    #[error("letter code '{0}' appears more than once in the taxonomy")]
    Duplicate(LetterCode),
    #[error("exempt letter code '{0}' is not part of the taxonomy")]
    UnknownExempt(LetterCode),
}

impl LetterCodeTaxonomy {
    pub fn standard() -> Self {
        Self {
            codes: STANDARD_CODES.iter().copied().map(LetterCode::from).collect(),
            exempt: STANDARD_EXEMPT.iter().copied().map(LetterCode::from).collect(),
        }
    }

    pub fn new<I, E>(codes: I, exempt: E) -> Result<Self, TaxonomyError>
    where
        I: IntoIterator<Item = LetterCode>,
        E: IntoIterator<Item = LetterCode>,
    {
        let codes: Vec<LetterCode> = codes.into_iter().collect();
        if codes.is_empty() {
            return Err(TaxonomyError::Empty);
        }

        let mut seen = HashSet::with_capacity(codes.len());
        for code in &codes {
            if !seen.insert(code) {
                return Err(TaxonomyError::Duplicate(code.clone()));
            }
        }

        let mut exempt_set = HashSet::new();
        for code in exempt {
            if !seen.contains(&code) {
                return Err(TaxonomyError::UnknownExempt(code));
            }
            exempt_set.insert(code);
        }

        Ok(Self {
            codes,
            exempt: exempt_set,
        })
    }

    pub fn codes(&self) -> &[LetterCode] {
        &self.codes
    }

    pub fn len(&self) -> usize {
        self.codes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.codes.is_empty()
    }

    pub fn is_exempt(&self, code: &LetterCode) -> bool {
        self.exempt.contains(code)
    }

    pub fn position(&self, code: &LetterCode) -> Option<usize> {
        self.codes.iter().position(|candidate| candidate == code)
    }
}

impl Default for LetterCodeTaxonomy {
    fn default() -> Self {
        Self::standard()
    }
}
