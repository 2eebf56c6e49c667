//! Entity declarations and the per-parse general/parameter symbol tables.

use std::{collections::HashMap, rc::Rc};

/// One declared entity.
///
/// The XML grammar only distinguishes internal entities (inline
/// replacement text) from external ones (public/system identifier, and
/// optionally an `NDATA` notation marking the entity unparsed).
#[derive(Debug, Clone, PartialEq)]
pub enum XmlEntity {
    Internal {
        name: Rc<str>,
        /// Replacement text as written, character references included;
        /// they are decoded where the entity is substituted.
        content: String,
        parameter: bool,
        from_internal_subset: bool,
    },
    External {
        name: Rc<str>,
        public_id: Option<String>,
        system_id: String,
        /// `Some` marks an unparsed entity (`NDATA notation`).
        notation: Option<Rc<str>>,
        parameter: bool,
        from_internal_subset: bool,
    },
}

impl XmlEntity {
    pub fn name(&self) -> &Rc<str> {
        match self {
            Self::Internal { name, .. } | Self::External { name, .. } => name,
        }
    }

    pub fn is_parameter(&self) -> bool {
        match self {
            Self::Internal { parameter, .. } | Self::External { parameter, .. } => *parameter,
        }
    }

    pub fn is_unparsed(&self) -> bool {
        matches!(self, Self::External { notation: Some(_), .. })
    }

    pub fn system_id(&self) -> Option<&str> {
        match self {
            Self::Internal { .. } => None,
            Self::External { system_id, .. } => Some(system_id),
        }
    }
}

/// Result of a declaration attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntityInsertion {
    Added,
    /// A declaration for this name already exists; the original wins.
    AlreadyDeclared,
    /// The name shadows one of the five predefined entities.
    ShadowsPredefined,
}

/// The two independent entity symbol tables of one parse.
///
/// General entities answer `&name;`, parameter entities answer `%name;`.
/// The first declaration of a name sticks; later duplicates are reported
/// by the caller but never stored over the original.
#[derive(Default)]
pub struct XmlEntityTable {
    general: HashMap<Rc<str>, Rc<XmlEntity>>,
    parameter: HashMap<Rc<str>, Rc<XmlEntity>>,
}

/// The five entities every XML processor predefines, stored with the
/// double-escaped replacement text of XML 1.0 section 4.6 so that their
/// expansion inside attribute literals yields data, not markup.
pub const PREDEFINED_ENTITIES: [(&str, &str); 5] = [
    ("lt", "&#60;"),
    ("gt", "&#62;"),
    ("amp", "&#38;"),
    ("apos", "&#39;"),
    ("quot", "&#34;"),
];

impl XmlEntityTable {
    /// Create the tables with the predefined five already seeded.
    pub fn new(mut intern: impl FnMut(&str) -> Rc<str>) -> Self {
        let mut table = Self::default();
        for (name, content) in PREDEFINED_ENTITIES {
            let name = intern(name);
            table.general.insert(
                Rc::clone(&name),
                Rc::new(XmlEntity::Internal {
                    name,
                    content: content.to_string(),
                    parameter: false,
                    from_internal_subset: false,
                }),
            );
        }
        table
    }

    /// Record a declaration in the table matching the entity's class.
    #[doc(alias = "xmlAddEntity")]
    pub fn add(&mut self, entity: XmlEntity) -> EntityInsertion {
        let table = if entity.is_parameter() {
            &mut self.parameter
        } else {
            &mut self.general
        };
        let name = Rc::clone(entity.name());
        if table.contains_key(&name) {
            if !entity.is_parameter() && PREDEFINED_ENTITIES.iter().any(|(n, _)| *n == &*name) {
                // The predefined five may be redeclared; keep the seeded
                // definition so substitution results never change.
                return EntityInsertion::ShadowsPredefined;
            }
            return EntityInsertion::AlreadyDeclared;
        }
        table.insert(name, Rc::new(entity));
        EntityInsertion::Added
    }

    #[doc(alias = "xmlGetDocEntity")]
    pub fn get_general(&self, name: &str) -> Option<Rc<XmlEntity>> {
        self.general.get(name).cloned()
    }

    #[doc(alias = "xmlGetParameterEntity")]
    pub fn get_parameter(&self, name: &str) -> Option<Rc<XmlEntity>> {
        self.parameter.get(name).cloned()
    }

    /// Drop everything, predefined entities included. Used by the parse
    /// cleanup path; a fresh table is built for the next parse.
    pub fn clear(&mut self) {
        self.general.clear();
        self.parameter.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn intern(s: &str) -> Rc<str> {
        Rc::from(s)
    }

    #[test]
    fn predefined_entities_are_seeded() {
        let table = XmlEntityTable::new(intern);
        for name in ["amp", "lt", "gt", "quot", "apos"] {
            assert!(table.get_general(name).is_some(), "{name} missing");
        }
        assert!(table.get_parameter("amp").is_none());
    }

    #[test]
    fn first_declaration_sticks() {
        let mut table = XmlEntityTable::new(intern);
        let first = XmlEntity::Internal {
            name: intern("e"),
            content: "one".to_string(),
            parameter: false,
            from_internal_subset: true,
        };
        let second = XmlEntity::Internal {
            name: intern("e"),
            content: "two".to_string(),
            parameter: false,
            from_internal_subset: true,
        };
        assert_eq!(table.add(first), EntityInsertion::Added);
        assert_eq!(table.add(second), EntityInsertion::AlreadyDeclared);
        let XmlEntity::Internal { content, .. } = &*table.get_general("e").unwrap() else {
            panic!("expected an internal entity");
        };
        assert_eq!(content, "one");
    }

    #[test]
    fn general_and_parameter_tables_are_independent() {
        let mut table = XmlEntityTable::new(intern);
        table.add(XmlEntity::Internal {
            name: intern("e"),
            content: "general".to_string(),
            parameter: false,
            from_internal_subset: true,
        });
        table.add(XmlEntity::Internal {
            name: intern("e"),
            content: "parameter".to_string(),
            parameter: true,
            from_internal_subset: true,
        });
        let XmlEntity::Internal { content, .. } = &*table.get_parameter("e").unwrap() else {
            panic!("expected an internal entity");
        };
        assert_eq!(content, "parameter");
    }

    #[test]
    fn predefined_redefinition_keeps_seeded_content() {
        let mut table = XmlEntityTable::new(intern);
        let shadow = XmlEntity::Internal {
            name: intern("amp"),
            content: "not an ampersand".to_string(),
            parameter: false,
            from_internal_subset: true,
        };
        assert_eq!(table.add(shadow), EntityInsertion::ShadowsPredefined);
        let XmlEntity::Internal { content, .. } = &*table.get_general("amp").unwrap() else {
            panic!("expected an internal entity");
        };
        assert_eq!(content, "&#38;");
    }
}
