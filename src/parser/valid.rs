//! Deferred validity bookkeeping: the ID/IDREF table, the notation
//! table, and the end-of-parse sweep that resolves forward references.

use std::{collections::HashMap, rc::Rc};

use crate::{
    error::XmlParserErrors,
    parser::{DtdParserCtxt, error::xml_validity_error},
};

/// ID/IDREF consistency table.
///
/// `true` means the name was declared as an ID, `false` that it has only
/// been referenced as an IDREF so far. IDREF may point forward, so the
/// invariant (every entry `true`) is checked only at end of parse.
#[derive(Debug, Default)]
pub struct IdTable {
    entries: HashMap<Rc<str>, bool>,
}

impl IdTable {
    /// Record an ID declaration. Returns `false` when the name was
    /// already declared as an ID (a validity error at the caller).
    #[doc(alias = "xmlAddID")]
    pub fn add_id(&mut self, name: Rc<str>) -> bool {
        match self.entries.insert(name, true) {
            Some(true) => false,
            _ => true,
        }
    }

    /// Record an IDREF usage; harmless if the ID is already declared.
    #[doc(alias = "xmlAddRef")]
    pub fn add_ref(&mut self, name: Rc<str>) {
        self.entries.entry(name).or_insert(false);
    }

    /// Names referenced as IDREF and never declared as ID, in sorted
    /// order so diagnostics are deterministic.
    pub fn unresolved(&self) -> Vec<Rc<str>> {
        let mut names: Vec<_> = self
            .entries
            .iter()
            .filter(|(_, declared)| !**declared)
            .map(|(name, _)| Rc::clone(name))
            .collect();
        names.sort();
        names
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

#[derive(Debug, Clone)]
pub enum NotationState {
    Declared {
        public_id: Option<String>,
        system_id: Option<String>,
    },
    /// Named by an NDATA clause or NOTATION attribute type before (or
    /// without) a declaration; an allowed forward reference until the
    /// end of the parse.
    Referenced,
}

/// Notation symbol table.
#[derive(Debug, Default)]
pub struct NotationTable {
    entries: HashMap<Rc<str>, NotationState>,
}

impl NotationTable {
    /// Record a declaration. Returns `false` on redeclaration.
    #[doc(alias = "xmlAddNotationDecl")]
    pub fn declare(
        &mut self,
        name: Rc<str>,
        public_id: Option<String>,
        system_id: Option<String>,
    ) -> bool {
        match self.entries.get(&name) {
            Some(NotationState::Declared { .. }) => false,
            _ => {
                self.entries.insert(
                    name,
                    NotationState::Declared {
                        public_id,
                        system_id,
                    },
                );
                true
            }
        }
    }

    /// Record a reference from an unparsed entity or a NOTATION-type
    /// attribute.
    pub fn reference(&mut self, name: Rc<str>) {
        self.entries.entry(name).or_insert(NotationState::Referenced);
    }

    /// Names referenced but never declared, sorted.
    pub fn undeclared(&self) -> Vec<Rc<str>> {
        let mut names: Vec<_> = self
            .entries
            .iter()
            .filter(|(_, state)| matches!(state, NotationState::Referenced))
            .map(|(name, _)| Rc::clone(name))
            .collect();
        names.sort();
        names
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

/// Check a language tag against the RFC 1766 grammar used by `xml:lang`.
///
/// ```text
/// Language-Tag = Primary-tag *( "-" Subtag )
/// Primary-tag  = 2ALPHA / "i" / "x"   ; ISO 639, registered or private tags
/// Subtag       = 1*8(ALPHA / DIGIT)
/// ```
#[doc(alias = "xmlCheckLanguageID")]
pub(crate) fn check_language_id(lang: &str) -> bool {
    let mut subtags = lang.split('-');
    let Some(primary) = subtags.next() else {
        return false;
    };
    let primary_ok = match primary.len() {
        1 => primary.eq_ignore_ascii_case("i") || primary.eq_ignore_ascii_case("x"),
        2 => primary.chars().all(|c| c.is_ascii_alphabetic()),
        _ => false,
    };
    if !primary_ok {
        return false;
    }
    subtags.all(|subtag| {
        (1..=8).contains(&subtag.len()) && subtag.chars().all(|c| c.is_ascii_alphanumeric())
    })
}

impl DtdParserCtxt<'_> {
    /// The one pass allowed to report dangling IDREFs and undeclared
    /// notations, run after the whole DTD has been consumed.
    #[doc(alias = "xmlValidateDtdFinal")]
    pub(crate) fn validate_dtd_final(&mut self) {
        for name in self.ids.unresolved() {
            xml_validity_error!(
                self,
                XmlParserErrors::XmlDTDUnknownID,
                "IDREF attribute value '{}' references an unknown ID",
                name
            );
        }
        for name in self.notations.undeclared() {
            xml_validity_error!(
                self,
                XmlParserErrors::XmlDTDUnknownNotation,
                "Notation '{}' is referenced but never declared",
                name
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn idrefs_resolve_in_any_order() {
        let mut ids = IdTable::default();
        ids.add_ref(Rc::from("forward"));
        assert!(ids.add_id(Rc::from("forward")));
        assert!(ids.add_id(Rc::from("backward")));
        ids.add_ref(Rc::from("backward"));
        assert!(ids.unresolved().is_empty());
    }

    #[test]
    fn dangling_idref_is_reported_once() {
        let mut ids = IdTable::default();
        ids.add_ref(Rc::from("nowhere"));
        ids.add_ref(Rc::from("nowhere"));
        assert_eq!(ids.unresolved(), vec![Rc::<str>::from("nowhere")]);
    }

    #[test]
    fn double_id_declaration_is_rejected() {
        let mut ids = IdTable::default();
        assert!(ids.add_id(Rc::from("dup")));
        assert!(!ids.add_id(Rc::from("dup")));
    }

    #[test]
    fn notation_forward_reference() {
        let mut notations = NotationTable::default();
        notations.reference(Rc::from("gif"));
        assert!(notations.declare(Rc::from("gif"), None, Some("gif-viewer".to_string())));
        assert!(notations.undeclared().is_empty());
        assert!(!notations.declare(Rc::from("gif"), None, None));
    }

    #[test]
    fn language_ids() {
        assert!(check_language_id("en"));
        assert!(check_language_id("en-US"));
        assert!(check_language_id("i-klingon"));
        assert!(check_language_id("x-private-42"));
        assert!(!check_language_id("english"));
        assert!(!check_language_id("eng"));
        assert!(!check_language_id("en--US"));
        assert!(!check_language_id("123"));
        assert!(!check_language_id(""));
    }
}
