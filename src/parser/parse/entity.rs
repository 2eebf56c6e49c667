//! Entity declarations and the two reference-aware literal scanners.
//!
//! Entity values and attribute values follow different inclusion rules
//! (4.4 of the recommendation): in an entity value character and general
//! entity references are stored unexpanded while parameter entities are
//! included literally; in an attribute value character references become
//! data and internal general entities are expanded in place.

use std::rc::Rc;

use crate::{
    chvalid::xml_is_char,
    entity::{EntityInsertion, XmlEntity},
    error::{XmlError, XmlParserErrors},
    parser::{
        DtdParserCtxt,
        context::XML_MAX_TEXT_LENGTH,
        error::{xml_err_msg_str, xml_fatal_err_msg, xml_warning_msg},
        input::ParserInputKind,
    },
};

impl DtdParserCtxt<'_> {
    /// Parse a character reference, with `&#` already consumed.
    ///
    /// ```text
    /// [66] CharRef ::= '&#' [0-9]+ ';' | '&#x' [0-9a-fA-F]+ ';'
    /// ```
    ///
    /// Returns the referenced character after checking it against the
    /// Char production.
    #[doc(alias = "xmlParseCharRef")]
    pub(crate) fn parse_char_ref(&mut self) -> Result<char, XmlError> {
        let hex = self.consume_char_if(|c| c == 'x')?.is_some();
        let mut val: u32 = 0;
        let mut digits = 0usize;
        let mut overflow = false;
        while let Some(c) = self.consume_char_if(|c| {
            if hex {
                c.is_ascii_hexdigit()
            } else {
                c.is_ascii_digit()
            }
        })? {
            let digit = c.to_digit(if hex { 16 } else { 10 }).unwrap_or(0);
            val = match val
                .checked_mul(if hex { 16 } else { 10 })
                .and_then(|v| v.checked_add(digit))
            {
                Some(v) => v,
                None => {
                    overflow = true;
                    0
                }
            };
            digits += 1;
        }
        if digits == 0 || self.consume_char_if(|c| c == ';')?.is_none() {
            let code = if hex {
                XmlParserErrors::XmlErrInvalidHexCharRef
            } else {
                XmlParserErrors::XmlErrInvalidDecCharRef
            };
            return Err(xml_fatal_err_msg!(
                self,
                code,
                "xmlParseCharRef: invalid value"
            ));
        }
        match char::from_u32(val) {
            Some(c) if !overflow && xml_is_char(val) => Ok(c),
            _ => Err(xml_fatal_err_msg!(
                self,
                XmlParserErrors::XmlErrInvalidCharRef,
                "xmlParseCharRef: invalid XmlChar value {}",
                val
            )),
        }
    }

    /// Parse an entity value literal.
    ///
    /// ```text
    /// [9] EntityValue ::= '"' ([^%&"] | PEReference | Reference)* '"' |
    ///                     "'" ([^%&'] | PEReference | Reference)* "'"
    /// ```
    ///
    /// Character and general entity references are validated but kept
    /// unexpanded in the stored replacement text. Parameter entities are
    /// included literally by pushing their replacement as a new input,
    /// so the closing quote only counts when it appears in the input the
    /// literal started in.
    #[doc(alias = "xmlParseEntityValue")]
    pub(crate) fn parse_entity_value(&mut self) -> Result<String, XmlError> {
        let lexical_pe = self.lexical_pe;
        self.lexical_pe = false;
        let result = self.parse_entity_value_inner();
        self.lexical_pe = lexical_pe;
        result
    }

    fn parse_entity_value_inner(&mut self) -> Result<String, XmlError> {
        let stop = match self.consume_char_if(|c| c == '"' || c == '\'')? {
            Some(c) => c,
            None => {
                return Err(xml_fatal_err_msg!(
                    self,
                    XmlParserErrors::XmlErrLiteralNotStarted,
                    "EntityValue: \" or ' expected"
                ));
            }
        };
        let literal_input = self.current_input_id();
        let mut buf = String::new();
        loop {
            let Some(c) = self.getc()? else {
                return Err(xml_fatal_err_msg!(
                    self,
                    XmlParserErrors::XmlErrEntityNotFinished,
                    "EntityValue not terminated"
                ));
            };
            match c {
                c if c == stop && self.current_input_id() == literal_input => break,
                '&' => {
                    if self.consume_char_if(|c| c == '#')?.is_some() {
                        // Validated here, expanded only when the entity
                        // is substituted, so "&#38;" stays inert data.
                        let decoded = self.parse_char_ref()?;
                        buf.push_str("&#");
                        buf.push_str(&(decoded as u32).to_string());
                        buf.push(';');
                    } else {
                        let Some(name) = self.parse_name()? else {
                            return Err(xml_fatal_err_msg!(
                                self,
                                XmlParserErrors::XmlErrEntityCharError,
                                "EntityValue: '&' forbidden except for entities references"
                            ));
                        };
                        if self.consume_char_if(|c| c == ';')?.is_none() {
                            return Err(xml_fatal_err_msg!(
                                self,
                                XmlParserErrors::XmlErrEntityRefSemicolMissing,
                                "EntityRef: expecting ';' after '&{}'",
                                name
                            ));
                        }
                        // Bypassed: stored for expansion at usage time.
                        buf.push('&');
                        buf.push_str(&name);
                        buf.push(';');
                    }
                }
                '%' => {
                    let Some(name) = self.parse_name()? else {
                        return Err(xml_fatal_err_msg!(
                            self,
                            XmlParserErrors::XmlErrPERefNoName,
                            "PEReference: no name"
                        ));
                    };
                    if self.consume_char_if(|c| c == ';')?.is_none() {
                        return Err(xml_fatal_err_msg!(
                            self,
                            XmlParserErrors::XmlErrPERefSemicolMissing,
                            "PEReference: expecting ';' after '%{}'",
                            name
                        ));
                    }
                    if self.in_internal_subset
                        && self.input().is_some_and(|input| input.is_document())
                    {
                        return Err(xml_fatal_err_msg!(
                            self,
                            XmlParserErrors::XmlErrEntityPEInternal,
                            "PEReferences forbidden in internal subset"
                        ));
                    }
                    self.parameter_entity_include_in_literal(&name)?;
                }
                c => buf.push(c),
            }
            if buf.len() > XML_MAX_TEXT_LENGTH {
                return Err(xml_fatal_err_msg!(
                    self,
                    XmlParserErrors::XmlErrResourceLimit,
                    "entity value too long"
                ));
            }
        }
        Ok(buf)
    }

    /// Parse an attribute value literal, as used by default declarations.
    ///
    /// ```text
    /// [10] AttValue ::= '"' ([^<&"] | Reference)* '"' |
    ///                   "'" ([^<&'] | Reference)* "'"
    /// ```
    ///
    /// Character references are decoded straight into the value, so an
    /// expansion that produces "&#38;" yields a plain ampersand that is
    /// never re-read as markup. Internal general entities are expanded
    /// in place; external ones are not allowed here at all.
    #[doc(alias = "xmlParseAttValue")]
    pub(crate) fn parse_att_value(&mut self) -> Result<String, XmlError> {
        let lexical_pe = self.lexical_pe;
        self.lexical_pe = false;
        let result = self.parse_att_value_inner();
        self.lexical_pe = lexical_pe;
        result
    }

    fn parse_att_value_inner(&mut self) -> Result<String, XmlError> {
        let stop = match self.consume_char_if(|c| c == '"' || c == '\'')? {
            Some(c) => c,
            None => {
                return Err(xml_fatal_err_msg!(
                    self,
                    XmlParserErrors::XmlErrLiteralNotStarted,
                    "AttValue: \" or ' expected"
                ));
            }
        };
        let literal_input = self.current_input_id();
        let mut buf = String::new();
        loop {
            let Some(c) = self.getc()? else {
                return Err(xml_fatal_err_msg!(
                    self,
                    XmlParserErrors::XmlErrLiteralNotFinished,
                    "AttValue: literal not terminated"
                ));
            };
            match c {
                c if c == stop && self.current_input_id() == literal_input => break,
                '<' => {
                    return Err(xml_fatal_err_msg!(
                        self,
                        XmlParserErrors::XmlErrLtInAttribute,
                        "Unescaped '<' not allowed in attributes values"
                    ));
                }
                '&' => {
                    if self.consume_char_if(|c| c == '#')?.is_some() {
                        buf.push(self.parse_char_ref()?);
                    } else {
                        let Some(name) = self.parse_name()? else {
                            return Err(xml_fatal_err_msg!(
                                self,
                                XmlParserErrors::XmlErrEntityCharError,
                                "AttValue: '&' was not started by an entity reference"
                            ));
                        };
                        if self.consume_char_if(|c| c == ';')?.is_none() {
                            return Err(xml_fatal_err_msg!(
                                self,
                                XmlParserErrors::XmlErrEntityRefSemicolMissing,
                                "EntityRef: expecting ';' after '&{}'",
                                name
                            ));
                        }
                        self.general_entity_include(&name)?;
                    }
                }
                c if c == '\u{9}' || c == '\u{A}' => buf.push(' '),
                c => buf.push(c),
            }
            if buf.len() > XML_MAX_TEXT_LENGTH {
                return Err(xml_fatal_err_msg!(
                    self,
                    XmlParserErrors::XmlErrResourceLimit,
                    "attribute value too long"
                ));
            }
        }
        Ok(buf)
    }

    /// Expand a general entity reference found inside an attribute
    /// value by pushing its replacement text as a new input.
    fn general_entity_include(&mut self, name: &str) -> Result<(), XmlError> {
        let Some(entity) = self.entities.get_general(name) else {
            xml_err_msg_str!(
                self,
                XmlParserErrors::XmlErrUndeclaredEntity,
                "Entity '{}' not defined",
                name
            );
            return Ok(());
        };
        match &*entity {
            XmlEntity::Internal { content, .. } => {
                let content = content.clone();
                self.push_entity_input(&entity, &content, ParserInputKind::InternalEntity)
            }
            XmlEntity::External { notation: Some(_), .. } => Err(xml_fatal_err_msg!(
                self,
                XmlParserErrors::XmlErrEntityIsExternal,
                "Attribute references unparsed entity '{}'",
                name
            )),
            XmlEntity::External { .. } => Err(xml_fatal_err_msg!(
                self,
                XmlParserErrors::XmlErrEntityIsExternal,
                "Attribute references external entity '{}'",
                name
            )),
        }
    }

    /// Parse an entity declaration, with `<!ENTITY` already consumed.
    ///
    /// ```text
    /// [70] EntityDecl  ::= GEDecl | PEDecl
    /// [71] GEDecl      ::= '<!ENTITY' S Name S EntityDef S? '>'
    /// [72] PEDecl      ::= '<!ENTITY' S '%' S Name S PEDef S? '>'
    /// [73] EntityDef   ::= EntityValue | (ExternalID NDataDecl?)
    /// [74] PEDef       ::= EntityValue | ExternalID
    /// [76] NDataDecl   ::= S 'NDATA' S Name
    /// ```
    #[doc(alias = "xmlParseEntityDecl")]
    pub(crate) fn parse_entity_decl(&mut self) -> Result<(), XmlError> {
        let inputid = self.current_input_id();
        self.require_whitespace("after '<!ENTITY'")?;
        // A '%' here opens a PEDecl rather than a reference; the reader
        // only splices '%' followed by a name start character.
        let is_parameter = self.consume_char_if(|c| c == '%')?.is_some();
        if is_parameter {
            self.require_whitespace("after '%'")?;
        }
        let name = self.parse_name_req("in entity declaration")?;
        if name.contains(':') {
            xml_err_msg_str!(
                self,
                XmlParserErrors::XmlNsErrColon,
                "colons are forbidden from entities names '{}'",
                name
            );
        }
        self.require_whitespace("after the entity name")?;
        let interned = self.intern(&name);

        if matches!(self.peek_char()?, Some('"') | Some('\'')) {
            let value = self.parse_entity_value()?;
            if !is_parameter {
                self.sync_locator();
                self.handler.internal_general_entity_decl(&name, &value);
            }
            self.record_entity(XmlEntity::Internal {
                name: interned,
                content: value,
                parameter: is_parameter,
                from_internal_subset: self.in_internal_subset,
            });
        } else {
            let (public_id, system_id) = self.parse_external_id(true)?;
            let Some(system_id) = system_id else {
                return Err(xml_fatal_err_msg!(
                    self,
                    XmlParserErrors::XmlErrValueRequired,
                    "Entity value required"
                ));
            };
            if system_id.contains('#') {
                xml_err_msg_str!(
                    self,
                    XmlParserErrors::XmlErrURIFragment,
                    "Fragment not allowed: URI contains '#'"
                );
            }
            let mut notation = None;
            let blanks = self.skip_blanks()?;
            if !is_parameter && self.peek("NDATA")? {
                if blanks == 0 {
                    return Err(xml_fatal_err_msg!(
                        self,
                        XmlParserErrors::XmlErrSpaceRequired,
                        "Space required before 'NDATA'"
                    ));
                }
                self.require_whitespace("after 'NDATA'")?;
                let ndata = self.parse_name_req("after 'NDATA'")?;
                let ndata = self.intern(&ndata);
                self.notations.reference(Rc::clone(&ndata));
                notation = Some(ndata);
            }
            if !is_parameter {
                self.sync_locator();
                match &notation {
                    Some(ndata) => self.handler.unparsed_entity_decl(
                        &name,
                        public_id.as_deref(),
                        &system_id,
                        ndata,
                    ),
                    None => self.handler.external_general_entity_decl(
                        &name,
                        public_id.as_deref(),
                        &system_id,
                    ),
                }
            }
            self.record_entity(XmlEntity::External {
                name: interned,
                public_id,
                system_id,
                notation,
                parameter: is_parameter,
                from_internal_subset: self.in_internal_subset,
            });
        }

        self.skip_blanks()?;
        if self.current_input_id() != inputid {
            return Err(xml_fatal_err_msg!(
                self,
                XmlParserErrors::XmlErrEntityBoundary,
                "Entity declaration doesn't start and stop in the same entity"
            ));
        }
        if !self.peek(">")? {
            return Err(xml_fatal_err_msg!(
                self,
                XmlParserErrors::XmlErrEntityNotFinished,
                "entity {} not terminated",
                name
            ));
        }
        Ok(())
    }

    /// Store a declaration; the first declaration of a name sticks and
    /// later duplicates only draw a warning.
    fn record_entity(&mut self, entity: XmlEntity) {
        let name = entity.name().to_string();
        let parameter = entity.is_parameter();
        match self.entities.add(entity) {
            EntityInsertion::Added => {}
            EntityInsertion::AlreadyDeclared if parameter => {
                xml_warning_msg!(
                    self,
                    XmlParserErrors::XmlWarEntityRedefined,
                    "Parameter entity '{}' redefined, keeping the first declaration",
                    name
                );
            }
            EntityInsertion::AlreadyDeclared => {
                xml_warning_msg!(
                    self,
                    XmlParserErrors::XmlWarEntityRedefined,
                    "Entity '{}' redefined, keeping the first declaration",
                    name
                );
            }
            EntityInsertion::ShadowsPredefined => {
                xml_warning_msg!(
                    self,
                    XmlParserErrors::XmlWarEntityRedefined,
                    "Redefinition of predefined entity '{}'",
                    name
                );
            }
        }
    }
}
